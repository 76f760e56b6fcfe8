//! Configuration types
//!
//! [`ClientConfig`] describes how to reach the API and how fast to call it.
//! [`PaginationConfig`] describes how many records one fetch loop may
//! deliver and how it sizes its pages. Both load from YAML and fill in
//! defaults for anything left out.

use crate::error::{Error, Result, ResultExt};
use crate::http::RateLimiterConfig;
use crate::types::{
    BackoffType, EmptyPagePolicy, API_VERSION, COMMUNITY_ENDPOINT, DEFAULT_PAGE_SIZE,
    UNBOUNDED_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable overriding the endpoint
pub const ENDPOINT_ENV: &str = "COINMETRICS_ENDPOINT";

/// Environment variable overriding the api key
pub const API_KEY_ENV: &str = "COINMETRICS_API_KEY";

// ============================================================================
// Pagination Config
// ============================================================================

/// Per-loop pagination settings
///
/// A fetch loop copies this value when it starts, so later changes only
/// affect loops started afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Maximum number of records to deliver, `-1` for no limit
    pub limit: i64,
    /// Records requested per call
    pub page_size: u32,
    /// Capacity of the data lane between the loop and its consumer
    pub lane_capacity: usize,
    /// What to do when the first page is empty
    pub empty_page_policy: EmptyPagePolicy,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            limit: UNBOUNDED_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            lane_capacity: 1,
            empty_page_policy: EmptyPagePolicy::Error,
        }
    }
}

impl PaginationConfig {
    /// Create a default pagination config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record limit
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the data lane capacity
    #[must_use]
    pub fn with_lane_capacity(mut self, capacity: usize) -> Self {
        self.lane_capacity = capacity;
        self
    }

    /// Set the empty first page policy
    #[must_use]
    pub fn with_empty_page_policy(mut self, policy: EmptyPagePolicy) -> Self {
        self.empty_page_policy = policy;
        self
    }

    /// Check that the config can drive a fetch loop
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }
        if self.lane_capacity == 0 {
            return Err(Error::invalid_value(
                "lane_capacity",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Client Config
// ============================================================================

/// Settings for the HTTP page fetcher and its paginator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API endpoint without the version segment
    pub endpoint: String,
    /// Api key appended to every request
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for 429 and 5xx responses
    pub max_retries: u32,
    /// Initial delay for backoff in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum delay for backoff in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration, `None` disables limiting
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
    /// Pagination defaults
    pub pagination: PaginationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: COMMUNITY_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 60_000,
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("coinmetrics-stream/{}", env!("CARGO_PKG_VERSION")),
            pagination: PaginationConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Apply `COINMETRICS_ENDPOINT` and `COINMETRICS_API_KEY` if set
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Initial backoff delay
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Maximum backoff delay
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Versioned base URL, e.g. `https://api.coinmetrics.io/v4/`
    pub fn base_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim_end_matches('/');
        let base = Url::parse(&format!("{endpoint}/"))?;
        Ok(base.join(&format!("{API_VERSION}/"))?)
    }

    /// Check the whole config
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if let Some(rate) = &self.rate_limit {
            if rate.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "rate_limit.requests_per_second",
                    "must be greater than 0",
                ));
            }
        }
        self.pagination.validate()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the api key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs();
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff_ms = initial.as_millis() as u64;
        self.config.max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set pagination defaults
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.config.pagination = pagination;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
