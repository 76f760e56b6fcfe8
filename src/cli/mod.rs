//! CLI module
//!
//! Command-line interface for fetching paginated resources.
//!
//! # Commands
//!
//! - `fetch` - Stream every record of a resource as JSON
//! - `config` - Show the effective configuration

mod commands;
mod runner;

pub use commands::{parse_param, parse_time, Cli, Commands, OutputFormat};
pub use runner::{build_request, Runner};
