use utxohash_utxo_snapshot::{DecodeConfig, MAX_SCRIPT_SIZE};

#[derive(Debug, Clone, clap::Args)]
pub struct DecodeParams {
    /// Specify the maximum size of a single scriptPubKey in bytes.
    ///
    /// Longer scripts abort the run.
    #[arg(long, value_name = "BYTES", default_value_t = MAX_SCRIPT_SIZE)]
    pub max_script_size: usize,
}

impl DecodeParams {
    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig {
            max_script_size: self.max_script_size,
        }
    }
}
