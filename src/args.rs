use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "yield-lead")]
#[command(about = "Harvests deduplicated business leads from Google Maps search")]
#[command(version)]
pub struct Args {
    /// Search query to harvest leads for
    pub query: String,

    /// Number of new records to fetch per round
    #[arg(short, long, default_value_t = 10)]
    pub count: usize,

    /// Google Maps API key (falls back to the GOOGLE_MAPS_API_KEY
    /// environment variable)
    #[arg(short, long)]
    pub api_key: Option<String>,

    /// Previously exported dataset (.csv, .xlsx, .xls) to dedupe against
    /// and append new records to
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Fetch rounds to run; rounds after the first continue from the
    /// previous continuation token and stop early once exhausted
    #[arg(short, long, default_value_t = 1)]
    pub rounds: usize,

    /// JSON configuration file overriding the default service settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}
