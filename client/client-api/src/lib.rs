pub mod base;
pub mod errors;
pub mod execution;
pub mod exts;

mod base_impls;
mod client;

pub use client::Client;
