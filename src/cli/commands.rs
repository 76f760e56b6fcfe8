//! CLI commands and argument parsing

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stream paginated Coin Metrics timeseries from the command line
#[derive(Parser, Debug)]
#[command(name = "coinmetrics-stream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API endpoint (overrides config and COINMETRICS_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// API key (overrides config and COINMETRICS_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page of a resource and print its records
    Fetch {
        /// Resource path, e.g. timeseries/market-candles
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Maximum records to fetch (-1 = all)
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,

        /// Records requested per call
        #[arg(long)]
        page_size: Option<u32>,

        /// Candle or metric frequency, e.g. 1d
        #[arg(long)]
        frequency: Option<String>,

        /// Start of the time range (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_time)]
        start_time: Option<DateTime<Utc>>,

        /// End of the time range (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_time)]
        end_time: Option<DateTime<Utc>>,
    },

    /// Print the effective configuration
    Config,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// Parse `key=value`
pub fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse an RFC 3339 timestamp or a plain date at midnight UTC
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid time '{s}', expected RFC 3339 or YYYY-MM-DD"))
}
