pub mod executor;
pub mod getter;
