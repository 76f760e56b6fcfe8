//! Common types and constants
//!
//! Shared by the pagination core and the HTTP fetcher.

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// API version segment appended to the endpoint
pub const API_VERSION: &str = "v4";

/// Query parameter carrying the api key
pub const API_KEY_PARAM: &str = "api_key";

/// Query parameter carrying the page size
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Query parameter carrying the continuation token
pub const NEXT_PAGE_TOKEN_PARAM: &str = "next_page_token";

/// Number of records requested per call when no limit applies
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Record limit meaning "fetch everything"
pub const UNBOUNDED_LIMIT: i64 = -1;

/// Message for an empty first page
pub const NO_DATA_FOUND: &str = "no data found";

/// Default endpoint for the community tier
pub const COMMUNITY_ENDPOINT: &str = "https://community-api.coinmetrics.io/";

// ============================================================================
// Page Result
// ============================================================================

/// Structured error object returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable error type, e.g. `bad_parameter`
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

/// Error envelope, `{"error": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// The wrapped error
    pub error: ApiError,
}

/// Outcome of one page fetch
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult<T> {
    /// A page of records
    Data {
        /// Records in server order
        items: Vec<T>,
        /// Continuation token, absent on the last page
        next_page_token: Option<String>,
    },
    /// Invalid filter or id value
    BadRequest(ApiError),
    /// Authentication failed
    Unauthorized(ApiError),
    /// Authenticated but not allowed
    Forbidden(ApiError),
    /// The fetcher failed in-band
    Transport(String),
}

impl<T> PageResult<T> {
    /// Create a data page
    pub fn data(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self::Data {
            items,
            next_page_token,
        }
    }

    /// Create the last data page
    pub fn last(items: Vec<T>) -> Self {
        Self::data(items, None)
    }

    /// Check if this is a data page
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }
}

/// A successfully classified page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records in server order
    pub items: Vec<T>,
    /// Continuation token, absent on the last page
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// Check if the page has no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if the server signalled the last page
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// Wire shape of a successful timeseries response
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    /// Records
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Continuation token
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Policy for a first page that contains no records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPagePolicy {
    /// Fail with `NoDataFound`
    #[default]
    Error,
    /// Finish cleanly with zero records
    Finish,
}

/// Backoff strategy used by the HTTP fetcher between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_response_deserialize() {
        let body = json!({
            "data": [{"asset": "btc", "time": "2021-03-07T00:00:00.000000000Z"}],
            "next_page_token": "0.MjAyMS0wMy0wN1Q"
        });
        let resp: DataResponse<serde_json::Value> = serde_json::from_value(body).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert_eq!(resp.next_page_token.as_deref(), Some("0.MjAyMS0wMy0wN1Q"));
    }

    #[test]
    fn test_data_response_without_token() {
        let resp: DataResponse<u32> = serde_json::from_value(json!({"data": [1, 2]})).unwrap();
        assert_eq!(resp.data, vec![1, 2]);
        assert!(resp.next_page_token.is_none());
    }

    #[test]
    fn test_error_envelope_deserialize() {
        let body = json!({
            "error": {
                "type": "bad_parameter",
                "message": "Bad parameter 'assets'. Value 'sdvwbtc' is not supported."
            }
        });
        let env: ErrorEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(env.error.error_type, "bad_parameter");
        assert!(env.error.message.contains("sdvwbtc"));
    }

    #[test]
    fn test_page_helpers() {
        let page = Page {
            items: vec![1],
            next_page_token: None,
        };
        assert!(page.is_last());
        assert!(!page.is_empty());
        assert!(PageResult::last(vec![1]).is_data());
        assert!(!PageResult::<u8>::Transport("reset".into()).is_data());
    }

    #[test]
    fn test_empty_page_policy_serde() {
        let policy: EmptyPagePolicy = serde_json::from_value(json!("finish")).unwrap();
        assert_eq!(policy, EmptyPagePolicy::Finish);
        assert_eq!(EmptyPagePolicy::default(), EmptyPagePolicy::Error);
    }
}
