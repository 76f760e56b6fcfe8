//! Execution engine module
//!
//! Fetch loop orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Paginator` - Client-scoped entry point owning a fetcher, a shared rate
//!   limiter and the pagination defaults
//! - `RecordStream` - Live, backpressured records from one fetch loop
//! - `materialize` / `Collected` - The same records as one ordered collection
//! - `PageFetcher` - The single page fetch operation the engine drives

mod fetch_loop;
mod materialize;
mod stream;
mod types;

pub use materialize::{materialize, Collected};
pub use stream::{Lanes, RecordStream};
pub use types::{FetchStats, LoopExit, PageFetcher};

use crate::config::{ClientConfig, PaginationConfig};
use crate::context::Context;
use crate::error::Result;
use crate::http::{HttpClient, RateLimiter, RateLimiterConfig};
use fetch_loop::FetchLoop;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Turns a page fetcher into record streams and collections
///
/// Clones share the fetcher and the rate limiter but not the pagination
/// config, and every loop copies the config when it starts.
pub struct Paginator<F> {
    fetcher: Arc<F>,
    limiter: Option<RateLimiter>,
    config: PaginationConfig,
}

impl<F: PageFetcher> Paginator<F> {
    /// Create a paginator with the default rate limit and pagination config
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            limiter: Some(RateLimiter::new(&RateLimiterConfig::default())),
            config: PaginationConfig::default(),
        }
    }

    /// Set pagination configuration
    pub fn with_config(mut self, config: PaginationConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Share an existing rate limiter
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.limiter = None;
        self
    }

    /// Set the record limit for loops started from now on, `-1` for none
    pub fn set_limit(&mut self, limit: i64) {
        self.config.limit = limit;
    }

    /// Current record limit
    pub fn limit(&self) -> i64 {
        self.config.limit
    }

    /// Set the page size for loops started from now on
    pub fn set_page_size(&mut self, page_size: u32) -> Result<()> {
        let config = self.config.clone().with_page_size(page_size);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Get the pagination config
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Get the page fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Get the shared rate limiter
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    /// Start a fetch loop in the background and stream its records
    ///
    /// Must be called inside a Tokio runtime.
    pub fn stream(&self, ctx: &Context, request: F::Request) -> RecordStream<F::Record> {
        let config = self.config.clone();
        let (data_tx, data_rx) = mpsc::channel(config.lane_capacity);
        let (error_tx, error_rx) = oneshot::channel();

        let fetch_loop = FetchLoop {
            fetcher: Arc::clone(&self.fetcher),
            limiter: self.limiter.clone(),
            config,
            ctx: ctx.clone(),
            request,
            data_tx,
            error_tx,
        };
        let handle = tokio::spawn(fetch_loop.run());

        RecordStream::new(data_rx, error_rx, handle)
    }

    /// Fetch every record into one collection
    pub async fn collect(&self, ctx: &Context, request: F::Request) -> Collected<F::Record> {
        let mut stream = self.stream(ctx, request);
        let mut collected = materialize(&mut stream).await;
        match stream.join().await {
            Ok(stats) => info!(
                pages = stats.pages_fetched,
                records = stats.records_delivered,
                failed = !collected.is_ok(),
                "Collected records"
            ),
            Err(e) => {
                warn!(error = %e, records = collected.len(), "Fetch loop did not finish");
                if collected.error.is_none() {
                    collected.error = Some(e);
                }
            }
        }
        collected
    }
}

impl Paginator<HttpClient> {
    /// Create an HTTP paginator from a client config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::with_config(config.clone())?;
        Ok(Self {
            fetcher: Arc::new(client),
            limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            config: config.pagination.clone(),
        })
    }
}

impl<F> Clone for Paginator<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            limiter: self.limiter.clone(),
            config: self.config.clone(),
        }
    }
}

impl<F> std::fmt::Debug for Paginator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}
