//! Batched calls to the lineage service.

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{BatchResponse, Error, LineageApi, QueryObject, Result};

/// Entities per call accepted by the lineage endpoint.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Slice `queries` into consecutive batches of at most `batch_size` entities.
///
/// Only the last batch may be shorter; no batch is empty. A `batch_size` of
/// zero is treated as one.
#[must_use]
pub fn split_batches(queries: &[QueryObject], batch_size: usize) -> Vec<&[QueryObject]> {
    queries.chunks(batch_size.max(1)).collect()
}

/// Issues one lineage call per batch.
///
/// Up to `concurrency` calls run at once, but results are always returned in
/// batch order.
#[derive(Clone)]
pub struct BatchClient {
    api: Arc<dyn LineageApi>,
    batch_size: usize,
    concurrency: usize,
    call_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl BatchClient {
    pub fn new(api: Arc<dyn LineageApi>) -> Self {
        Self {
            api,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
            call_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Bound every call, retries included.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn call(&self, index: usize, batch: &[QueryObject]) -> Result<BatchResponse> {
        debug!("Calling lineage service: batch={index}, entities={}", batch.len());
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.api.fetch(batch))
                .await
                .unwrap_or(Err(Error::Timeout)),
            None => self.api.fetch(batch).await,
        }
    }

    /// Fetch every batch of `queries`.
    ///
    /// The outer `Err` is only [`Error::Cancelled`]; per-batch failures are
    /// returned in place so the caller can count them.
    pub async fn fetch_all(&self, queries: &[QueryObject]) -> Result<Vec<Result<BatchResponse>>> {
        let batches: Vec<Vec<QueryObject>> = split_batches(queries, self.batch_size)
            .into_iter()
            .map(<[QueryObject]>::to_vec)
            .collect();
        let mut results = Vec::with_capacity(batches.len());

        let mut responses = pin!(
            stream::iter(batches.into_iter().enumerate())
                .map(|(index, batch)| {
                    let client = self.clone();
                    async move { client.call(index, &batch).await }.boxed()
                })
                .buffered(self.concurrency)
        );

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                next = responses.next() => match next {
                    Some(result) => results.push(result),
                    None => break,
                },
            }
        }

        Ok(results)
    }
}
