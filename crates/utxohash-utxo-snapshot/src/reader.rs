use crate::coin::{decode_coin, tx_out_ser, DecodeOutcome};
use crate::progress::Progress;
use crate::serialize::read_array;
use crate::sink::UtxoSink;
use crate::{DecodeConfig, Result};
use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use utxohash_crypto::{MuHash3072, MuHashDigest};

/// Header preceding the coin records of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMetadata {
    /// Hash of the block the snapshot was taken at.
    pub base_blockhash: BlockHash,
    /// Number of coin records that follow.
    pub coins_count: u64,
}

impl SnapshotMetadata {
    /// Serialized size of the header.
    pub const SIZE: usize = 32 + 8;

    pub fn serialize<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.base_blockhash.to_byte_array())?;
        writer.write_all(&self.coins_count.to_le_bytes())?;
        Ok(())
    }

    pub fn deserialize<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let base_blockhash = BlockHash::from_byte_array(read_array(reader, "base block hash")?);
        let coins_count = u64::from_le_bytes(read_array(reader, "coins count")?);
        Ok(Self {
            base_blockhash,
            coins_count,
        })
    }
}

/// Streaming reader over the coin records of a snapshot.
///
/// Yields exactly `coins_count` outcomes unless decoding fails, after which the iterator is
/// fused.
pub struct SnapshotReader<R> {
    reader: R,
    metadata: SnapshotMetadata,
    config: DecodeConfig,
    coins_read: u64,
    failed: bool,
}

impl SnapshotReader<BufReader<File>> {
    /// Opens the snapshot file at `path` and reads its header.
    pub fn open(path: impl AsRef<Path>, config: DecodeConfig) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), config)
    }
}

impl<R: Read> SnapshotReader<R> {
    /// Reads the header from `reader`, leaving it positioned at the first coin record.
    pub fn new(mut reader: R, config: DecodeConfig) -> Result<Self> {
        let metadata = SnapshotMetadata::deserialize(&mut reader)?;
        Ok(Self {
            reader,
            metadata,
            config,
            coins_read: 0,
            failed: false,
        })
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Number of coin records consumed so far, skipped ones included.
    pub fn coins_read(&self) -> u64 {
        self.coins_read
    }

    /// Whether any bytes remain in the stream.
    ///
    /// Only meaningful once all declared coins have been read.
    pub fn has_trailing_data(&mut self) -> Result<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(n) => return Ok(n > 0),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl<R: Read> Iterator for SnapshotReader<R> {
    type Item = Result<DecodeOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.coins_read == self.metadata.coins_count {
            return None;
        }

        match decode_coin(&mut self.reader, &self.config) {
            Ok(outcome) => {
                self.coins_read += 1;
                Some(Ok(outcome))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Outcome of a full pass over a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub block_hash: BlockHash,
    /// Coin count declared by the header.
    pub coins_count: u64,
    pub coins_read: u64,
    /// Coins left out of the commitment, see [`crate::SkipReason`].
    pub coins_skipped: u64,
    /// Bytes remained after the last declared coin.
    pub trailing_data: bool,
    pub muhash: MuHashDigest,
}

impl SnapshotSummary {
    /// Coins that made it into both the commitment and the sink.
    pub fn coins_written(&self) -> u64 {
        self.coins_read - self.coins_skipped
    }
}

/// Decodes every coin of the snapshot, hands the decoded ones to `sink` and accumulates their
/// canonical serialization into a MuHash.
pub fn process_snapshot<R, S>(mut reader: SnapshotReader<R>, sink: &mut S) -> Result<SnapshotSummary>
where
    R: Read,
    S: UtxoSink + ?Sized,
{
    let SnapshotMetadata {
        base_blockhash,
        coins_count,
    } = *reader.metadata();
    let max_script_size = reader.config().max_script_size;

    tracing::info!("UTXO snapshot at block {base_blockhash}, contains {coins_count} coins");

    let mut muhash = MuHash3072::new();
    let mut progress = Progress::new(Some(coins_count));
    let mut coins_read = 0u64;
    let mut coins_skipped = 0u64;

    for outcome in reader.by_ref() {
        match outcome? {
            DecodeOutcome::Decoded(utxo) => {
                tracing::debug!(
                    "{}: height={}, coinbase={}, amount={}, script_pubkey={}",
                    utxo.outpoint(),
                    utxo.coin.height,
                    utxo.coin.is_coinbase,
                    utxo.coin.amount,
                    hex::encode(&utxo.coin.script_pubkey),
                );

                let data = tx_out_ser(utxo.outpoint(), &utxo.coin, max_script_size)?;
                muhash.insert(&data);

                sink.push(&utxo)?;
            }
            DecodeOutcome::Skipped { outpoint, reason } => {
                tracing::debug!("Skipping {outpoint}: {reason}");
                coins_skipped += 1;
            }
        }

        coins_read += 1;
        progress.update(coins_read, coins_skipped);
    }

    sink.finish()?;

    let muhash = muhash.finalize();

    let trailing_data = reader.has_trailing_data()?;
    if trailing_data {
        tracing::warn!("Snapshot is not at EOF after {coins_count} coins, ignoring trailing data");
    }

    let summary = SnapshotSummary {
        block_hash: base_blockhash,
        coins_count,
        coins_read,
        coins_skipped,
        trailing_data,
        muhash,
    };

    tracing::info!(
        "Total coins read: {coins_read}, skipped: {coins_skipped}, written: {}",
        summary.coins_written()
    );

    Ok(summary)
}
