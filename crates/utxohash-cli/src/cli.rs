pub mod params;

use crate::commands::generate::Generate;
use crate::commands::hash_csv::HashCsv;
use crate::commands::muhash::MuHash;
use crate::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Compute the MuHash of a UTXO set snapshot.
    ///
    /// The result equals the `muhash` field of Bitcoin Core's `gettxoutsetinfo muhash` at the
    /// snapshot block.
    #[command(name = "muhash")]
    MuHash(MuHash),

    /// Compute the MuHash of the coins persisted by `muhash --csv`.
    #[command(name = "hash-csv")]
    HashCsv(HashCsv),

    /// Write a UTXO set snapshot from the coins persisted by `muhash --csv`.
    Generate(Generate),
}

/// utxohash
#[derive(Debug, Parser)]
#[clap(version)]
#[clap(about = "Compute the MuHash commitment of a Bitcoin Core UTXO set snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log every decoded coin.
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Parse and run command line arguments
pub fn run() -> Result<()> {
    let Cli { command, verbose } = Cli::parse();

    init_logger(verbose);

    match command {
        Command::MuHash(cmd) => cmd.execute(),
        Command::HashCsv(cmd) => cmd.execute(),
        Command::Generate(cmd) => cmd.execute(),
    }
}

// Logs go to stderr, stdout only carries the results.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
