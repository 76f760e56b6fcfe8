//! Engine types
//!
//! The page fetch contract and per-loop statistics.

use crate::context::Context;
use crate::error::Result;
use crate::request::PageRequest;
use crate::types::PageResult;
use async_trait::async_trait;

/// Fetches one page for a request descriptor
///
/// Implementations must honor `ctx` cancellation and must not retry
/// classified failures.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    /// Request descriptor consumed by this fetcher
    type Request: PageRequest;
    /// Record type of each page
    type Record: Send + 'static;

    /// Fetch the page described by `request`
    async fn fetch(
        &self,
        ctx: &Context,
        request: &Self::Request,
    ) -> Result<PageResult<Self::Record>>;
}

/// Statistics from one fetch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Pages fetched
    pub pages_fetched: u64,
    /// Records delivered to the consumer
    pub records_delivered: u64,
    /// How the loop ended
    pub exit: LoopExit,
}

/// How a fetch loop ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopExit {
    /// Budget spent, last page reached, or empty page after data
    #[default]
    Done,
    /// An error was sent on the error lane
    Failed,
    /// The consumer dropped the data lane
    Abandoned,
}
