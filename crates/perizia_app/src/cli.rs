use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_logging::LogDestination;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "perizia",
    version,
    about = "Submit auction PDFs for lot analysis and browse the extracted lots"
)]
pub struct Cli {
    /// PDF files to analyze; anything that is not a PDF is skipped
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// RON configuration file (defaults to ./perizia.ron when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the analysis service
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seconds between status checks
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Give up after this many status checks
    #[arg(long)]
    pub max_poll_attempts: Option<u32>,

    /// Which top-level result keys count as lots
    #[arg(long, value_enum)]
    pub lot_filter: Option<LotFilterArg>,

    /// Needle for `--lot-filter key-contains`
    #[arg(long, default_value = "lotto")]
    pub lot_key: String,

    /// Show the details of this lot once the analysis succeeds
    #[arg(long)]
    pub lot: Option<String>,

    /// Write the analysis result as `<job_id>.json` into this directory
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Log destination: file, terminal or both
    #[arg(long, default_value = "file")]
    pub log: LogDestination,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LotFilterArg {
    ExcludeMetering,
    KeyContains,
}
