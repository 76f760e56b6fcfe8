// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Coin Metrics Stream
//!
//! Cursor-paginated, rate-limited client core for the Coin Metrics
//! timeseries API.
//!
//! ## Features
//!
//! - **Budgeted Pagination**: Page sizes shrink so a record limit is never overshot
//! - **Shared Rate Limiting**: One token bucket across every concurrent loop
//! - **Two-Lane Streaming**: Records and the terminal error arrive on separate lanes
//! - **Cancellation**: Abandon a fetch from any await point
//! - **Materialization**: Collect a whole stream, keeping partial results on failure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coinmetrics_stream::{ClientConfig, Context, Paginator, TimeseriesRequest};
//!
//! #[tokio::main]
//! async fn main() -> coinmetrics_stream::Result<()> {
//!     let config = ClientConfig::default().with_env_overrides();
//!     let paginator = Paginator::from_config(&config)?;
//!
//!     let request = TimeseriesRequest::new("timeseries/market-candles")
//!         .param("markets", "bibox-aaa-usdt-spot")
//!         .frequency("1d");
//!
//!     let mut stream = paginator.stream(&Context::background(), request);
//!     while let Some(record) = stream.recv().await {
//!         println!("{}", record?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Paginator                               │
//! │  stream(ctx, request) → RecordStream    collect() → Collected   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────┬───┴─────────┬────────────┬───────────┐
//! │ Rate Limit │ Negotiation │ Fetch Loop  │  Classify  │   HTTP    │
//! ├────────────┼─────────────┼─────────────┼────────────┼───────────┤
//! │ Token      │ Budget      │ Cursor      │ Data       │ Retry     │
//! │ bucket     │ page size   │ Cancel      │ 400/401/403│ Backoff   │
//! └────────────┴─────────────┴─────────────┴────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and classification
pub mod error;

/// Wire types and constants
pub mod types;

/// Cancellation context
pub mod context;

/// Page result classification
pub mod classify;

/// Request parameters
pub mod request;

/// HTTP client with retry and rate limiting
pub mod http;

/// Record budget and page-size negotiation
pub mod pagination;

/// Fetch loop, stream adapter and materializer
pub mod engine;

/// Client configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use classify::classify;
pub use config::{ClientConfig, PaginationConfig};
pub use context::{CancelHandle, Context};
pub use engine::{materialize, Collected, FetchStats, LoopExit, PageFetcher, Paginator, RecordStream};
pub use http::{HttpClient, RateLimiter, RateLimiterConfig};
pub use request::{PageRequest, TimeseriesRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
