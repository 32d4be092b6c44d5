use crate::cli::params::DecodeParams;
use crate::Result;
use std::path::{Path, PathBuf};
use utxohash_utxo_snapshot::{hash_utxos, CsvSource, MuHashDigest};

#[derive(Debug, Clone, clap::Args)]
pub struct HashCsv {
    /// Path to the CSV file exported by `muhash --csv`.
    #[arg(index = 1, value_name = "CSV")]
    pub csv: PathBuf,

    #[allow(missing_docs)]
    #[clap(flatten)]
    pub decode_params: DecodeParams,
}

impl HashCsv {
    pub fn execute(self) -> Result<()> {
        let muhash = hash_csv(&self.csv, self.decode_params.max_script_size)?;

        println!("MuHash: {muhash}");

        Ok(())
    }
}

pub(crate) fn hash_csv(path: &Path, max_script_size: usize) -> Result<MuHashDigest> {
    let source = CsvSource::open(path)?;
    let (coins, muhash) = hash_utxos(source.into_utxos(), max_script_size)?;
    tracing::info!("Hashed {coins} coins from {}", path.display());
    Ok(muhash)
}
