pub mod address_lookup_table;
pub mod compute_budget;
pub mod fee;
