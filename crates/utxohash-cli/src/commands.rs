pub mod generate;
pub mod hash_csv;
pub mod muhash;
