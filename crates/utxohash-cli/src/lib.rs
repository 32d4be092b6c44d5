//! Command line interface of utxohash.

mod cli;
mod commands;
mod error;

pub use self::cli::run;
pub use self::error::{Error, Result};
