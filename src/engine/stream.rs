//! Stream adapter
//!
//! A [`RecordStream`] is the consumer side of one fetch loop: a data lane
//! carrying records in delivery order and an error lane carrying at most one
//! terminal error. Both close when the loop exits.
//!
//! Read it as a whole with [`RecordStream::recv`] or as a
//! [`futures::Stream`], which yield every record and then the terminal
//! error, or split it with [`RecordStream::into_lanes`] and select over the
//! lanes directly. Dropping the stream early stops the background loop at
//! its next send.

use super::types::FetchStats;
use crate::error::{Error, Result};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Live records from one fetch loop
#[derive(Debug)]
pub struct RecordStream<T> {
    data: mpsc::Receiver<T>,
    error: Option<oneshot::Receiver<Error>>,
    handle: JoinHandle<FetchStats>,
}

/// The raw lanes of a [`RecordStream`]
#[derive(Debug)]
pub struct Lanes<T> {
    /// Records in delivery order, closed when the loop exits
    pub data: mpsc::Receiver<T>,
    /// The terminal error, if the loop failed
    pub error: oneshot::Receiver<Error>,
    /// The background loop
    pub handle: JoinHandle<FetchStats>,
}

impl<T> RecordStream<T> {
    pub(crate) fn new(
        data: mpsc::Receiver<T>,
        error: oneshot::Receiver<Error>,
        handle: JoinHandle<FetchStats>,
    ) -> Self {
        Self {
            data,
            error: Some(error),
            handle,
        }
    }

    /// Receive the next record, or the terminal error once records run out
    ///
    /// Returns `None` after the stream is finished.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        if let Some(item) = self.data.recv().await {
            return Some(Ok(item));
        }
        let error = self.error.take()?;
        error.await.ok().map(Err)
    }

    /// Split into the data lane, the error lane and the loop handle
    pub fn into_lanes(self) -> Lanes<T> {
        let error = self.error.unwrap_or_else(|| {
            // already consumed: hand out a closed lane
            let (_, rx) = oneshot::channel();
            rx
        });
        Lanes {
            data: self.data,
            error,
            handle: self.handle,
        }
    }

    /// Stop reading and wait for the background loop to exit
    pub async fn join(self) -> Result<FetchStats> {
        let Self { data, handle, .. } = self;
        drop(data);
        handle
            .await
            .map_err(|e| Error::transport(format!("Fetch loop task failed: {e}")))
    }
}

impl<T> Stream for RecordStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.data.poll_recv(cx) {
            Poll::Ready(Some(item)) => return Poll::Ready(Some(Ok(item))),
            Poll::Ready(None) => {}
            Poll::Pending => return Poll::Pending,
        }

        let Some(error) = this.error.as_mut() else {
            return Poll::Ready(None);
        };
        match Pin::new(error).poll(cx) {
            Poll::Ready(result) => {
                this.error = None;
                Poll::Ready(result.ok().map(Err))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
