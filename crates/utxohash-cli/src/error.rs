/// Errors surfaced by the command line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input.
    #[error("Invalid input: {0}")]
    Input(String),

    /// Failure while decoding or hashing the UTXO set.
    #[error(transparent)]
    Snapshot(#[from] utxohash_utxo_snapshot::Error),

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
