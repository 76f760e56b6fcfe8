//! HTTP page fetcher
//!
//! Fetches pages of a Coin Metrics style v4 API:
//! - Versioned base URL with the api key appended as a query parameter
//! - `data` / `next_page_token` success bodies
//! - `{"error": {...}}` bodies mapped onto [`PageResult`] failure variants
//! - Automatic retries with configurable backoff for 429 and 5xx
//!
//! Every wait (the request itself, the body read and the backoff sleep)
//! races the caller's [`Context`].

use crate::config::ClientConfig;
use crate::context::Context;
use crate::engine::PageFetcher;
use crate::error::{Error, Result};
use crate::request::TimeseriesRequest;
use crate::types::{
    ApiError, BackoffType, DataResponse, ErrorEnvelope, PageResult, API_KEY_PARAM,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for paginated timeseries endpoints
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Versioned base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for a request, api key included
    pub fn build_url(&self, request: &TimeseriesRequest) -> Result<Url> {
        let mut url = self.base_url.join(request.path.trim_start_matches('/'))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                query.append_pair(&key, &value);
            }
            if let Some(key) = &self.config.api_key {
                query.append_pair(API_KEY_PARAM, key);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    /// Fetch one page, decoding records as `T`
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: &TimeseriesRequest,
    ) -> Result<PageResult<T>> {
        let url = self.build_url(request)?;
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            let sent = until_cancelled(ctx, self.client.get(url.clone()).send()).await?;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                            extract_retry_after(&response)
                                .unwrap_or_else(|| self.calculate_backoff(attempt))
                        } else {
                            self.calculate_backoff(attempt)
                        };
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        until_cancelled(ctx, tokio::time::sleep(delay)).await?;
                        attempt += 1;
                        continue;
                    }

                    debug!("GET {} -> {}", request.path, status.as_u16());
                    let body = until_cancelled(ctx, response.text()).await??;
                    return decode_page(status, &body);
                }
                Err(e) => {
                    let error = if e.is_timeout() {
                        Error::Timeout {
                            timeout_ms: self.config.timeout().as_millis() as u64,
                        }
                    } else {
                        Error::Http(e)
                    };
                    if error.is_retryable() && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request error ({}), attempt {}/{}, retrying in {:?}",
                            error,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        until_cancelled(ctx, tokio::time::sleep(delay)).await?;
                        attempt += 1;
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff();
        let delay = match self.config.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial * (attempt + 1),
            BackoffType::Exponential => initial * 2u32.saturating_pow(attempt),
        };

        std::cmp::min(delay, self.config.max_backoff())
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    type Request = TimeseriesRequest;
    type Record = Value;

    async fn fetch(&self, ctx: &Context, request: &TimeseriesRequest) -> Result<PageResult<Value>> {
        self.fetch_page(ctx, request).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_api_key", &self.config.api_key.is_some())
            .field("max_retries", &self.config.max_retries)
            .finish_non_exhaustive()
    }
}

/// Map a response status and body onto a page result
fn decode_page<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<PageResult<T>> {
    match status {
        s if s.is_success() => {
            let parsed: DataResponse<T> = serde_json::from_str(body)?;
            Ok(PageResult::data(parsed.data, parsed.next_page_token))
        }
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
            Ok(PageResult::BadRequest(parse_api_error(status, body)))
        }
        StatusCode::UNAUTHORIZED => Ok(PageResult::Unauthorized(parse_api_error(status, body))),
        StatusCode::FORBIDDEN => Ok(PageResult::Forbidden(parse_api_error(status, body))),
        _ => Err(Error::http_status(status.as_u16(), body)),
    }
}

/// Parse an error envelope, falling back to the raw body
fn parse_api_error(status: StatusCode, body: &str) -> ApiError {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| {
            ApiError::new(
                status.canonical_reason().unwrap_or("error").to_lowercase(),
                body.trim(),
            )
        },
        |envelope| envelope.error,
    )
}

/// Await `fut` unless `ctx` is cancelled first
async fn until_cancelled<T>(ctx: &Context, fut: impl Future<Output = T>) -> Result<T> {
    tokio::select! {
        biased;
        () = ctx.cancelled() => Err(Error::Cancelled),
        out = fut => Ok(out),
    }
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod decode_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_success() {
        let body = json!({"data": [{"a": 1}], "next_page_token": "t"}).to_string();
        let page: PageResult<Value> = decode_page(StatusCode::OK, &body).unwrap();
        assert_eq!(page, PageResult::data(vec![json!({"a": 1})], Some("t".into())));
    }

    #[test]
    fn test_decode_error_statuses() {
        let body = json!({"error": {"type": "unauthorized", "message": "Requires key"}})
            .to_string();

        let page: PageResult<Value> = decode_page(StatusCode::UNAUTHORIZED, &body).unwrap();
        assert_eq!(
            page,
            PageResult::Unauthorized(ApiError::new("unauthorized", "Requires key"))
        );

        let page: PageResult<Value> = decode_page(StatusCode::NOT_FOUND, &body).unwrap();
        assert!(matches!(page, PageResult::BadRequest(_)));

        let page: PageResult<Value> = decode_page(StatusCode::FORBIDDEN, &body).unwrap();
        assert!(matches!(page, PageResult::Forbidden(_)));
    }

    #[test]
    fn test_decode_error_without_envelope() {
        let page: PageResult<Value> = decode_page(StatusCode::FORBIDDEN, "nope\n").unwrap();
        assert_eq!(page, PageResult::Forbidden(ApiError::new("forbidden", "nope")));
    }

    #[test]
    fn test_decode_unexpected_status() {
        let err = decode_page::<Value>(StatusCode::IM_A_TEAPOT, "teapot").unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 418, .. }));
    }

    #[test]
    fn test_retryable_statuses() {
        for code in [429, 500, 502, 503, 504, 520, 524] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(is_retryable_status(status), "{code} should be retried");
        }
        for code in [400, 401, 403, 404, 501] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(!is_retryable_status(status), "{code} should not be retried");
        }
    }

    #[test]
    fn test_decode_malformed_success_body() {
        let err = decode_page::<Value>(StatusCode::OK, "{not json").unwrap_err();
        assert!(matches!(err, Error::JsonParse(_)));
    }
}
