//! Request descriptors
//!
//! A request descriptor is the parameter bag for one paginated resource.
//! The fetch loop owns it for the lifetime of one invocation and writes the
//! two pagination fields before every call.

use crate::types::{NEXT_PAGE_TOKEN_PARAM, PAGE_SIZE_PARAM};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// Pagination fields the fetch loop is allowed to mutate
pub trait PageRequest: Send + Sync + 'static {
    /// Set the number of records requested by the next call
    fn set_page_size(&mut self, size: u32);

    /// Set the continuation token returned by the previous page
    fn set_next_page_token(&mut self, token: Option<String>);
}

/// Request for one `/timeseries/*` (or catalog) resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeseriesRequest {
    /// Path relative to the versioned base URL, e.g. `timeseries/market-candles`
    pub path: String,
    /// Filters and options
    pub params: BTreeMap<String, String>,
    /// Page size for the next call
    pub page_size: Option<u32>,
    /// Continuation token for the next call
    pub next_page_token: Option<String>,
}

impl TimeseriesRequest {
    /// Create a request for a path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the `frequency` parameter (e.g. `1d`, `1h`)
    #[must_use]
    pub fn frequency(self, frequency: impl Into<String>) -> Self {
        self.param("frequency", frequency)
    }

    /// Set the inclusive start of the time range
    #[must_use]
    pub fn start_time(self, start: DateTime<Utc>) -> Self {
        self.param("start_time", format_time(start))
    }

    /// Set the end of the time range
    #[must_use]
    pub fn end_time(self, end: DateTime<Utc>) -> Self {
        self.param("end_time", format_time(end))
    }

    /// All query parameters, pagination fields included
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(size) = self.page_size {
            pairs.push((PAGE_SIZE_PARAM.to_string(), size.to_string()));
        }
        if let Some(token) = &self.next_page_token {
            pairs.push((NEXT_PAGE_TOKEN_PARAM.to_string(), token.clone()));
        }
        pairs
    }
}

impl PageRequest for TimeseriesRequest {
    fn set_page_size(&mut self, size: u32) {
        self.page_size = Some(size);
    }

    fn set_next_page_token(&mut self, token: Option<String>) {
        self.next_page_token = token;
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
