use async_trait::async_trait;

use super::Transformer;
use crate::{EnrichmentStats, Record, Result};

/// Runs transformers in sequence, feeding each stage's output to the next.
///
/// On flush, stage `k` is flushed first and its output is pushed through
/// stages `k+1..` before those stages are flushed in turn.
#[derive(Default)]
pub struct ChainedTransformer {
    stages: Vec<Box<dyn Transformer>>,
}

impl ChainedTransformer {
    pub const SCOPE: &'static str = "transformer.chained";

    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl Transformer + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    async fn run_from(&mut self, start: usize, records: Vec<Record>) -> Result<Vec<Record>> {
        let mut records = records;
        for stage in &mut self.stages[start..] {
            let mut next = Vec::with_capacity(records.len());
            for record in records {
                next.extend(stage.transform(record).await?);
            }
            records = next;
        }
        Ok(records)
    }
}

#[async_trait]
impl Transformer for ChainedTransformer {
    async fn transform(&mut self, record: Record) -> Result<Vec<Record>> {
        self.run_from(0, vec![record]).await
    }

    async fn flush(&mut self) -> Result<Vec<Record>> {
        let mut output = Vec::new();
        for index in 0..self.stages.len() {
            let flushed = self.stages[index].flush().await?;
            output.extend(self.run_from(index + 1, flushed).await?);
        }
        Ok(output)
    }

    fn scope(&self) -> &'static str {
        Self::SCOPE
    }

    fn enrichment_stats(&self) -> Option<EnrichmentStats> {
        self.stages.iter().find_map(|stage| stage.enrichment_stats())
    }
}
