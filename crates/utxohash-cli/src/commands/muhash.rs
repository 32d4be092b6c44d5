use crate::cli::params::DecodeParams;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use utxohash_utxo_snapshot::{
    process_snapshot, CsvSink, DecodeConfig, DiscardSink, SnapshotReader, SnapshotSummary,
};

#[derive(Debug, Clone, clap::Args)]
pub struct MuHash {
    /// Path to the UTXO set snapshot.
    #[arg(index = 1, value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Export the decoded coins to a CSV file.
    ///
    /// Coins whose public key cannot be decompressed are not exported.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    #[allow(missing_docs)]
    #[clap(flatten)]
    pub decode_params: DecodeParams,
}

impl MuHash {
    pub fn execute(self) -> Result<()> {
        let summary = compute_muhash(
            &self.snapshot,
            self.csv.as_deref(),
            self.decode_params.decode_config(),
        )?;

        println!("MuHash: {}", summary.muhash);

        Ok(())
    }
}

pub(crate) fn compute_muhash(
    snapshot: &Path,
    csv: Option<&Path>,
    config: DecodeConfig,
) -> Result<SnapshotSummary> {
    if csv.is_some_and(|csv| is_same_file(csv, snapshot)) {
        return Err(Error::Input(format!(
            "CSV output {} would overwrite the snapshot",
            snapshot.display()
        )));
    }

    let reader = SnapshotReader::open(snapshot, config)?;

    let summary = match csv {
        Some(path) => {
            let mut sink = CsvSink::create(path)?;
            let summary = process_snapshot(reader, &mut sink)?;
            tracing::info!("Exported {} coins to {}", sink.written(), path.display());
            summary
        }
        None => process_snapshot(reader, &mut DiscardSink)?,
    };

    Ok(summary)
}

// A path that does not resolve yet cannot be the snapshot.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{write_snapshot, BLOCKS_1_2_MUHASH};
    use utxohash_utxo_snapshot::CsvSource;

    #[test]
    fn test_compute_muhash() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = write_snapshot(tmp.path());

        let summary = compute_muhash(&snapshot, None, DecodeConfig::default()).unwrap();
        assert_eq!(summary.coins_count, 2);
        assert_eq!(summary.coins_written(), 2);
        assert_eq!(summary.muhash.to_string(), BLOCKS_1_2_MUHASH);
    }

    #[test]
    fn test_compute_muhash_with_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = write_snapshot(tmp.path());
        let csv = tmp.path().join("utxo.csv");

        compute_muhash(&snapshot, Some(csv.as_path()), DecodeConfig::default()).unwrap();

        let exported = CsvSource::open(&csv).unwrap().into_utxos().count();
        assert_eq!(exported, 2);
    }

    #[test]
    fn test_csv_must_not_overwrite_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = write_snapshot(tmp.path());

        let snapshot_bytes = std::fs::read(&snapshot).unwrap();

        let dir = snapshot.parent().unwrap();
        let aliases = [
            snapshot.clone(),
            dir.join(".").join("utxo.dat"),
            dir.join("nested").join("..").join("utxo.dat"),
        ];
        std::fs::create_dir(dir.join("nested")).unwrap();

        for alias in aliases {
            assert!(matches!(
                compute_muhash(&snapshot, Some(alias.as_path()), DecodeConfig::default()),
                Err(Error::Input(_))
            ));
        }
        assert_eq!(std::fs::read(&snapshot).unwrap(), snapshot_bytes);
    }

    #[test]
    fn test_missing_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            compute_muhash(&tmp.path().join("missing.dat"), None, DecodeConfig::default()),
            Err(Error::Snapshot(utxohash_utxo_snapshot::Error::Io(_)))
        ));
    }
}
