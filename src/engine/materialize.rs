//! Materializer
//!
//! Drains a [`RecordStream`] into one ordered collection.

use super::stream::RecordStream;
use crate::error::{Error, Result};

/// Records collected from a stream, plus the error that ended it
#[derive(Debug)]
pub struct Collected<T> {
    /// Records in delivery order, including those before a failure
    pub records: Vec<T>,
    /// The terminal error, if any
    pub error: Option<Error>,
}

impl<T> Collected<T> {
    /// Check if the stream ended without error
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Number of records collected
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop partial results on failure
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }
}

/// Drain `stream`, stopping at the first error
pub async fn materialize<T>(stream: &mut RecordStream<T>) -> Collected<T> {
    let mut records = Vec::new();
    while let Some(item) = stream.recv().await {
        match item {
            Ok(record) => records.push(record),
            Err(e) => {
                return Collected {
                    records,
                    error: Some(e),
                }
            }
        }
    }
    Collected {
        records,
        error: None,
    }
}
