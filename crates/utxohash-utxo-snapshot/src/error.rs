//! Error types for snapshot decoding and hashing.

use std::fmt;

/// Fatal errors. Any of these aborts the run, since the accumulator has already absorbed every
/// coin before the failure and a partial digest is meaningless.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stream ended before a required field was fully read.
    #[error("Truncated input while reading {0}")]
    TruncatedInput(&'static str),

    /// Declared or computed script length exceeds the configured cap.
    #[error("Script too long ({size} > {max})")]
    ScriptTooLong { size: u64, max: usize },

    /// VarInt value does not fit in 64 bits.
    #[error("VarInt too large for u64")]
    VarIntOverflow,

    /// Height/coinbase code does not fit in the 32-bit hashing field.
    #[error("Height/coinbase code too large: {0}")]
    HeightOverflow(u64),

    /// Malformed record in a persisted UTXO dump.
    #[error("Invalid UTXO record: {0}")]
    InvalidRecord(String),

    /// Consensus encoding error.
    #[error("Consensus encoding error: {0}")]
    Encode(#[from] bitcoin::io::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a coin was left out of the commitment.
///
/// Skipping is a property of the input data rather than of the stream: the coin's bytes have been
/// fully consumed and decoding continues with the next record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The x-coordinate of a compressed uncompressed-P2PK key is not on secp256k1.
    UndecodablePoint,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndecodablePoint => write!(f, "undecodable public key"),
        }
    }
}
