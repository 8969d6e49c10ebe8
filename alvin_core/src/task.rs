//! Driver loop: extractor -> transformer -> loader.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{EnrichmentStats, Error, Extractor, Loader, Record, Result, StreamItem, Transformer};

/// What to do when a single record fails to decode, transform or load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log, count and move on to the next record.
    #[default]
    Skip,
    /// Stop pulling records. End of stream and close still run.
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub extracted: usize,
    pub loaded: usize,
    pub failed: usize,
    pub enrichment: Option<EnrichmentStats>,
}

pub struct Task<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    policy: ErrorPolicy,
    report: TaskReport,
}

impl<E, T, L> Task<E, T, L>
where
    E: Extractor,
    T: Transformer,
    L: Loader,
{
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
            policy: ErrorPolicy::default(),
            report: TaskReport::default(),
        }
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the task to completion.
    ///
    /// End of stream is delivered to the transformer exactly once and both
    /// collaborators are closed, whether the loop finished or failed. The
    /// first error encountered (loop, then flush, then close) is returned.
    pub async fn run(mut self) -> Result<TaskReport> {
        info!(
            "Running task: {} -> {} -> {}",
            self.extractor.scope(),
            self.transformer.scope(),
            self.loader.scope()
        );

        let pumped = self.pump().await;
        if let Err(e) = &pumped {
            warn!("Record loop stopped early: {e}");
        }

        let flushed = self.process(StreamItem::EndOfStream).await;
        let closed = self.close().await;

        self.report.enrichment = self.transformer.enrichment_stats();
        info!(
            "Task finished: extracted={}, loaded={}, failed={}",
            self.report.extracted, self.report.loaded, self.report.failed
        );

        pumped.and(flushed).and(closed)?;
        Ok(self.report)
    }

    /// Pull records until the extractor runs dry. An undecodable record goes
    /// through the error policy; any other extractor failure ends the loop.
    async fn pump(&mut self) -> Result<()> {
        loop {
            let record = match self.extractor.extract().await.map_err(Error::Extract) {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if e.is_invalid_record() => {
                    self.recover(e)?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.report.extracted += 1;
            if let Err(e) = self.process(StreamItem::Data(record)).await {
                self.recover(e)?;
            }
        }
        debug!("Extractor exhausted after {} records", self.report.extracted);
        Ok(())
    }

    /// Push one item through the transformer and load everything it yields.
    async fn process(&mut self, item: StreamItem) -> Result<()> {
        let outputs = self.transformer.process(item).await?;
        for record in &outputs {
            if let Err(e) = self.load(record).await {
                self.recover(e)?;
            }
        }
        Ok(())
    }

    fn recover(&mut self, error: Error) -> Result<()> {
        match self.policy {
            ErrorPolicy::Skip => {
                warn!("Skipping record after #{}: {error}", self.report.extracted);
                self.report.failed += 1;
                Ok(())
            }
            ErrorPolicy::Abort => Err(error),
        }
    }

    async fn load(&mut self, record: &Record) -> Result<()> {
        self.loader.load(record).await.map_err(Error::Load)?;
        self.report.loaded += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let extractor = self.extractor.close().await.map_err(Error::Extract);
        let loader = self.loader.close().await.map_err(Error::Load);
        extractor.and(loader)
    }
}
