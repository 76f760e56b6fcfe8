//! HTTP module
//!
//! Provides the HTTP page fetcher and the shared rate limiter.
//!
//! # Features
//!
//! - **Page Fetching**: `HttpClient` implements `PageFetcher` for v4 endpoints
//! - **Automatic Retries**: Configurable retry logic with backoff for 429/5xx
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Api Key Injection**: `api_key` query parameter on every request

mod client;
mod rate_limit;

pub use client::HttpClient;
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
