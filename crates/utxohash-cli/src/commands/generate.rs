use crate::Result;
use bitcoin::BlockHash;
use std::path::{Path, PathBuf};
use utxohash_utxo_snapshot::{CsvSource, UtxoSnapshotGenerator};

#[derive(Debug, Clone, clap::Args)]
pub struct Generate {
    /// Path to the CSV file exported by `muhash --csv`.
    #[arg(index = 1, value_name = "CSV")]
    pub csv: PathBuf,

    /// Hash of the block the UTXO set belongs to.
    #[arg(long, value_name = "HASH")]
    pub block_hash: BlockHash,

    /// Path of the snapshot to write.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,
}

impl Generate {
    pub fn execute(self) -> Result<()> {
        let coins_count = generate_snapshot(&self.csv, self.block_hash, &self.output)?;

        println!(
            "Snapshot at block {} with {coins_count} coins written to {}",
            self.block_hash,
            self.output.display()
        );

        Ok(())
    }
}

pub(crate) fn generate_snapshot(csv: &Path, block_hash: BlockHash, output: &Path) -> Result<u64> {
    let utxos = CsvSource::open(csv)?
        .into_utxos()
        .collect::<utxohash_utxo_snapshot::Result<Vec<_>>>()?;

    tracing::info!("Loaded {} coins from {}", utxos.len(), csv.display());

    let mut snapshot_generator = UtxoSnapshotGenerator::create(output)?;
    let coins_count = snapshot_generator.generate_snapshot_in_mem(block_hash, utxos)?;
    snapshot_generator.into_inner()?;

    Ok(coins_count)
}
