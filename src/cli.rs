use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fetchbatch")]
#[command(about = "Batch JSON downloader with bounded concurrency and retries", long_about = None)]
pub struct Cli {
    /// Settings file (default: fetchbatch.toml, or $FETCHBATCH_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one resource per identifier in the input file
    Download(DownloadArgs),
    /// List identifiers that have no saved result yet
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Newline-separated list of identifiers
    pub input_file: PathBuf,

    /// URL template; every `[INJECT]` is replaced by the identifier
    pub url_template: String,

    /// Output directory (must already exist)
    #[arg(short = 'O', long = "output")]
    pub output: Option<PathBuf>,

    /// Start every download at once instead of using the concurrency limit
    #[arg(short = 'N', long = "no-parallel")]
    pub no_parallel: bool,

    /// Where to write identifiers that failed every attempt
    #[arg(short = 'F', long = "failed-output")]
    pub failed_output: Option<PathBuf>,

    /// Maximum number of downloads in flight
    #[arg(short = 'C', long = "concurrency-limit")]
    pub concurrency_limit: Option<usize>,

    /// Skip identifiers that already have a saved result
    #[arg(short = 'S', long = "skip-existing")]
    pub skip_existing: bool,

    /// Extra attempts after the first failure
    #[arg(short = 'R', long = "retry-attempt")]
    pub retry_attempt: Option<u32>,

    /// Fetch method: fetch, curl or mock
    #[arg(short = 'M', long = "method")]
    pub method: Option<String>,

    /// Only log batch-level progress
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Newline-separated list of identifiers
    pub input_file: PathBuf,

    /// Directory holding saved results
    #[arg(short = 'O', long = "output")]
    pub output: Option<PathBuf>,

    /// Where to write identifiers without a saved result
    #[arg(long = "missing-output")]
    pub missing_output: Option<PathBuf>,
}
