//! Lineage enrichment transformer.
//!
//! Every record passes straight through and is buffered. At end of stream the
//! buffer is turned into query objects, sent to the lineage service in
//! batches, and the response rows come back out as derived records after all
//! pass-through output.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Transformer;
use crate::{
    BatchClient, BatchResponse, DEFAULT_BATCH_SIZE, EnrichmentStats, Error, LineageApi,
    QueryBuilder, Record, ResponseRow, Result, map_response,
};

/// Platform settings and batching knobs for [`AlvinTransformer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerSettings {
    pub platform_id: String,
    pub platform_type: String,
    pub dashboard_site_name: Option<String>,
    pub batch_size: usize,
    pub concurrency: usize,
}

impl TransformerSettings {
    pub fn new(platform_id: impl Into<String>, platform_type: impl Into<String>) -> Self {
        Self {
            platform_id: platform_id.into(),
            platform_type: platform_type.into(),
            dashboard_site_name: None,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
        }
    }

    #[must_use]
    pub fn with_dashboard_site_name(mut self, site: impl Into<String>) -> Self {
        self.dashboard_site_name = Some(site.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.platform_id.trim().is_empty() {
            return Err(Error::Config("platform_id is required".to_string()));
        }
        if self.platform_type.trim().is_empty() {
            return Err(Error::Config("platform_type is required".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accumulating,
    Flushing,
    Exhausted,
}

pub struct AlvinTransformer {
    builder: QueryBuilder,
    client: BatchClient,
    buffer: Vec<Record>,
    state: State,
    stats: EnrichmentStats,
}

impl AlvinTransformer {
    pub const SCOPE: &'static str = "transformer.alvin_transformer";

    pub fn new(settings: TransformerSettings, api: Arc<dyn LineageApi>) -> Result<Self> {
        settings.validate()?;

        let builder = QueryBuilder::new(
            settings.platform_id,
            settings.platform_type,
            settings.dashboard_site_name,
        );
        let client = BatchClient::new(api)
            .with_batch_size(settings.batch_size)
            .with_concurrency(settings.concurrency);

        Ok(Self {
            builder,
            client,
            buffer: Vec::new(),
            state: State::Accumulating,
            stats: EnrichmentStats::default(),
        })
    }

    /// Replace the batch client, e.g. to add a call timeout.
    #[must_use]
    pub fn with_client(mut self, configure: impl FnOnce(BatchClient) -> BatchClient) -> Self {
        self.client = configure(self.client);
        self
    }

    #[must_use]
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        self.with_client(|client| client.with_cancellation(cancel))
    }

    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub const fn stats(&self) -> EnrichmentStats {
        self.stats
    }

    fn collect_rows(&mut self, index: usize, outcome: Result<BatchResponse>, out: &mut Vec<Record>) {
        match outcome {
            Ok(BatchResponse::Rows(rows)) => {
                self.stats.rows += rows.len();
                for row in rows {
                    match map_response(ResponseRow::from_value(row)) {
                        Some(record) => {
                            self.stats.derived += 1;
                            out.push(record);
                        }
                        None => self.stats.dropped_rows += 1,
                    }
                }
            }
            Ok(BatchResponse::NotList(body)) => {
                debug!("Batch {index}: no lineage returned ({body})");
                self.stats.empty_responses += 1;
            }
            Ok(BatchResponse::Undecodable(reason)) => {
                warn!("Batch {index}: response is not valid JSON, skipping: {reason}");
                self.stats.decode_failures += 1;
            }
            Err(e) => {
                warn!("Batch {index}: lineage service call failed, skipping: {e}");
                self.stats.transport_failures += 1;
            }
        }
    }
}

#[async_trait]
impl Transformer for AlvinTransformer {
    async fn transform(&mut self, record: Record) -> Result<Vec<Record>> {
        if self.state != State::Accumulating {
            return Err(Error::Exhausted(Self::SCOPE));
        }
        self.buffer.push(record.clone());
        Ok(vec![record])
    }

    async fn flush(&mut self) -> Result<Vec<Record>> {
        if self.state != State::Accumulating {
            return Err(Error::Exhausted(Self::SCOPE));
        }
        self.state = State::Flushing;

        let records = std::mem::take(&mut self.buffer);
        let queries = self.builder.build_all(&records);
        drop(records);

        self.stats.query_objects = queries.len();
        self.stats.batches = queries.len().div_ceil(self.client.batch_size());
        info!(
            "Enriching {} entities in {} batches",
            self.stats.query_objects, self.stats.batches
        );

        let outcomes = self.client.fetch_all(&queries).await;
        self.state = State::Exhausted;

        let mut derived = Vec::new();
        for (index, outcome) in outcomes?.into_iter().enumerate() {
            self.collect_rows(index, outcome, &mut derived);
        }

        if self.stats.service_unreachable() {
            warn!(
                "Lineage service unreachable for all {} batches, no lineage emitted",
                self.stats.batches
            );
        }
        info!("Enrichment finished: {}", self.stats);

        Ok(derived)
    }

    fn scope(&self) -> &'static str {
        Self::SCOPE
    }

    fn enrichment_stats(&self) -> Option<EnrichmentStats> {
        (self.state == State::Exhausted).then_some(self.stats)
    }
}
