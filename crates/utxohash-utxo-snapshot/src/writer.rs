use crate::coin::{encode_coin, Utxo};
use crate::reader::SnapshotMetadata;
use crate::Result;
use bitcoin::BlockHash;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes UTXO set snapshots in the layout read by [`crate::SnapshotReader`].
pub struct UtxoSnapshotGenerator<W: Write> {
    writer: W,
}

impl UtxoSnapshotGenerator<BufWriter<File>> {
    /// Creates (or truncates) the snapshot file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> UtxoSnapshotGenerator<W> {
    /// Constructs a new instance of [`UtxoSnapshotGenerator`].
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the metadata of snapshot.
    pub fn write_snapshot_metadata(
        &mut self,
        block_hash: BlockHash,
        coins_count: u64,
    ) -> io::Result<()> {
        SnapshotMetadata {
            base_blockhash: block_hash,
            coins_count,
        }
        .serialize(&mut self.writer)
    }

    /// Writes a single entry of UTXO.
    pub fn write_utxo_entry(&mut self, utxo: &Utxo) -> io::Result<()> {
        encode_coin(&mut self.writer, utxo)
    }

    /// Writes the whole snapshot, coins ordered by outpoint as Bitcoin Core stores them.
    ///
    /// Returns the number of coins written.
    ///
    /// NOTE: this holds the entire set in memory.
    pub fn generate_snapshot_in_mem(
        &mut self,
        block_hash: BlockHash,
        utxos: impl IntoIterator<Item = Utxo>,
    ) -> io::Result<u64> {
        let mut utxos = utxos.into_iter().collect::<Vec<_>>();
        utxos.sort_by_key(|utxo| (utxo.txid, utxo.vout));

        let coins_count = utxos.len() as u64;
        self.write_snapshot_metadata(block_hash, coins_count)?;
        for utxo in &utxos {
            self.write_utxo_entry(utxo)?;
        }

        Ok(coins_count)
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
