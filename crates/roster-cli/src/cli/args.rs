use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Employee lookups that keep answering when the upstream does not"
)]
pub struct Cli {
    /// YAML config file (ROSTER_* environment variables still override it)
    #[arg(long, global = true, env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Upstream base URL
    #[arg(long, global = true)]
    pub upstream_url: Option<String>,

    /// Local replica database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text", env = "ROSTER_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve every employee
    List(ListArgs),
    /// Resolve one employee by id
    Get(GetArgs),
    /// Annual salary (monthly salary x 12) for one employee
    AnnualSalary(GetArgs),
    /// Search the local replica by name
    Search(SearchArgs),
    /// Records refreshed from the upstream after a timestamp
    UpdatedSince(UpdatedSinceArgs),
    /// Keep resolving on an interval with the scheduled cache reset running
    Watch(WatchArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print where the answer came from (cache, upstream, local-store) to stderr
    #[arg(long)]
    pub show_source: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Employee id
    pub id: String,

    /// Print where the answer came from to stderr
    #[arg(long)]
    pub show_source: bool,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Substring to look for in the name
    pub needle: String,

    /// Match case exactly
    #[arg(long)]
    pub case_sensitive: bool,
}

#[derive(Parser, Debug)]
pub struct UpdatedSinceArgs {
    /// RFC 3339 timestamp, e.g. 2026-01-31T00:00:00Z
    pub since: DateTime<Utc>,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Seconds between resolutions
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_secs: u64,

    /// Cache reset interval in seconds (default: daily at 00:00 UTC)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub reset_secs: Option<u64>,
}
