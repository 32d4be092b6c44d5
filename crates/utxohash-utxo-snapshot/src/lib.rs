//! Decoding of Bitcoin Core UTXO set snapshots and the `gettxoutsetinfo muhash` commitment over
//! them.

mod coin;
mod compressor;
mod error;
mod progress;
mod reader;
mod script;
mod serialize;
mod sink;
mod writer;

pub use self::coin::{
    decode_coin, encode_coin, tx_out_ser, Coin, DecodeOutcome, Utxo, MAX_HEIGHT,
};
pub use self::compressor::{compress_amount, compress_script, decompress_amount, MAX_MONEY};
pub use self::error::{Error, Result, SkipReason};
pub use self::reader::{process_snapshot, SnapshotMetadata, SnapshotReader, SnapshotSummary};
pub use self::script::{
    decompress_script, write_compressed_script, ScriptDecompression, NUM_SPECIAL_SCRIPTS,
};
pub use self::serialize::VarInt;
pub use self::sink::{CsvSink, CsvSource, DiscardSink, UtxoRecord, UtxoSink, CSV_FLUSH_INTERVAL};
pub use self::writer::UtxoSnapshotGenerator;
pub use utxohash_crypto::{MuHash3072, MuHashDigest};

use self::progress::Progress;

/// Default upper bound for a single `scriptPubKey`, in bytes.
///
/// https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/script/script.h#L36
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Tunables of the coin decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Longest literal or canonical script accepted before failing with
    /// [`Error::ScriptTooLong`].
    pub max_script_size: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_script_size: MAX_SCRIPT_SIZE,
        }
    }
}

/// Accumulates already decoded UTXOs into a MuHash.
///
/// Returns the number of coins hashed alongside the digest. Stops at the first error.
pub fn hash_utxos(
    utxos: impl IntoIterator<Item = Result<Utxo>>,
    max_script_size: usize,
) -> Result<(u64, MuHashDigest)> {
    let mut muhash = MuHash3072::new();
    let mut progress = Progress::new(None);
    let mut hashed = 0u64;

    for utxo in utxos {
        let utxo = utxo?;
        let data = tx_out_ser(utxo.outpoint(), &utxo.coin, max_script_size)?;
        muhash.insert(&data);

        hashed += 1;
        progress.update(hashed, 0);
    }

    Ok((hashed, muhash.finalize()))
}
