//! The background fetch loop
//!
//! Pages are fetched strictly one after another, since each request carries
//! the cursor of the page before it. Every item is handed to the data lane
//! in order; at most one error is sent on the error lane, after which both
//! lanes close.

use super::types::{FetchStats, LoopExit, PageFetcher};
use crate::classify::classify;
use crate::config::PaginationConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::RateLimiter;
use crate::pagination::PaginationState;
use crate::request::PageRequest;
use crate::types::EmptyPagePolicy;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Everything one loop invocation owns
pub(crate) struct FetchLoop<F: PageFetcher> {
    pub(crate) fetcher: Arc<F>,
    pub(crate) limiter: Option<RateLimiter>,
    pub(crate) config: PaginationConfig,
    pub(crate) ctx: Context,
    pub(crate) request: F::Request,
    pub(crate) data_tx: mpsc::Sender<F::Record>,
    pub(crate) error_tx: oneshot::Sender<Error>,
}

impl<F: PageFetcher> FetchLoop<F> {
    /// Run until done, failed or abandoned
    pub(crate) async fn run(self) -> FetchStats {
        let Self {
            fetcher,
            limiter,
            config,
            ctx,
            mut request,
            data_tx,
            error_tx,
        } = self;

        let mut state = PaginationState::new(config.limit);
        debug!(
            limit = config.limit,
            page_size = config.page_size,
            "Fetch loop started"
        );

        // a panicking fetcher still ends the loop with exactly one error
        let result = AssertUnwindSafe(fetch_pages(
            fetcher.as_ref(),
            limiter.as_ref(),
            &config,
            &ctx,
            &mut request,
            &data_tx,
            &mut state,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(Error::transport(format!(
                "Fetch loop panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

        let exit = match result {
            Ok(exit) => exit,
            Err(e) => {
                warn!(
                    error = %e,
                    pages = state.pages_fetched,
                    records = state.records_delivered,
                    "Fetch loop failed"
                );
                // consumer may already be gone
                let _ = error_tx.send(e);
                LoopExit::Failed
            }
        };
        drop(data_tx);

        debug!(
            ?exit,
            pages = state.pages_fetched,
            records = state.records_delivered,
            "Fetch loop finished"
        );

        FetchStats {
            pages_fetched: state.pages_fetched,
            records_delivered: state.records_delivered,
            exit,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

async fn fetch_pages<F: PageFetcher>(
    fetcher: &F,
    limiter: Option<&RateLimiter>,
    config: &PaginationConfig,
    ctx: &Context,
    request: &mut F::Request,
    data_tx: &mpsc::Sender<F::Record>,
    state: &mut PaginationState,
) -> Result<LoopExit> {
    loop {
        if state.is_exhausted() {
            return Ok(LoopExit::Done);
        }
        if data_tx.is_closed() {
            debug!("Consumer dropped the stream, stopping before next page");
            return Ok(LoopExit::Abandoned);
        }

        if let Some(limiter) = limiter {
            tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(Error::Cancelled),
                () = limiter.acquire() => {}
            }
        }

        let page_size = state.negotiate(config.page_size);
        request.set_page_size(page_size);
        request.set_next_page_token(state.cursor.clone());

        let result = fetcher.fetch(ctx, request).await?;
        state.add_page();
        let mut page = classify(result)?;

        debug!(
            page = state.pages_fetched,
            requested = page_size,
            received = page.items.len(),
            has_next = !page.is_last(),
            "Fetched page"
        );

        if page.is_empty() {
            if state.nothing_delivered() && config.empty_page_policy == EmptyPagePolicy::Error {
                return Err(Error::NoDataFound);
            }
            return Ok(LoopExit::Done);
        }

        let page_limit = page_size as usize;
        if !state.budget.is_unbounded() && page.items.len() > page_limit {
            warn!(
                requested = page_size,
                received = page.items.len(),
                "Server returned more records than requested, truncating"
            );
            page.items.truncate(page_limit);
        }

        for item in page.items {
            tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(Error::Cancelled),
                sent = data_tx.send(item) => {
                    if sent.is_err() {
                        debug!("Consumer dropped the stream mid-page");
                        return Ok(LoopExit::Abandoned);
                    }
                }
            }
            state.add_delivered();
        }

        state.set_cursor(page.next_page_token);
        if state.is_exhausted() || state.cursor.is_none() {
            return Ok(LoopExit::Done);
        }
    }
}
