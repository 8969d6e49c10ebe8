//! Record-in/records-out stream operators.

mod alvin;
mod chained;

use async_trait::async_trait;
use tracing::debug;

use crate::{EnrichmentStats, Record, Result};

pub use alvin::{AlvinTransformer, TransformerSettings};
pub use chained::ChainedTransformer;

/// A message on the record channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Data(Record),
    EndOfStream,
}

#[async_trait]
pub trait Transformer: Send {
    /// Handle one record, returning the records to forward downstream.
    async fn transform(&mut self, record: Record) -> Result<Vec<Record>>;

    /// Handle end of stream. Called once, after the last record.
    async fn flush(&mut self) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }

    /// Configuration namespace of this transformer.
    fn scope(&self) -> &'static str;

    fn enrichment_stats(&self) -> Option<EnrichmentStats> {
        None
    }

    async fn process(&mut self, item: StreamItem) -> Result<Vec<Record>> {
        match item {
            StreamItem::Data(record) => self.transform(record).await,
            StreamItem::EndOfStream => self.flush().await,
        }
    }
}

#[async_trait]
impl<T: Transformer + ?Sized> Transformer for Box<T> {
    async fn transform(&mut self, record: Record) -> Result<Vec<Record>> {
        (**self).transform(record).await
    }

    async fn flush(&mut self) -> Result<Vec<Record>> {
        (**self).flush().await
    }

    fn scope(&self) -> &'static str {
        (**self).scope()
    }

    fn enrichment_stats(&self) -> Option<EnrichmentStats> {
        (**self).enrichment_stats()
    }
}

/// Pass-through that logs every record it sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectTransformer;

impl InspectTransformer {
    pub const SCOPE: &'static str = "transformer.noop_print_transformer";
}

#[async_trait]
impl Transformer for InspectTransformer {
    async fn transform(&mut self, record: Record) -> Result<Vec<Record>> {
        match &record {
            Record::Table(table) => debug!("Table record: {}", table.key()),
            Record::Dashboard(dashboard) => debug!("Dashboard record: {}", dashboard.key()),
            other => debug!("Other record ({}): {}", other.kind(), other.key()),
        }
        Ok(vec![record])
    }

    fn scope(&self) -> &'static str {
        Self::SCOPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TableLineage, TableMetadata};

    #[tokio::test]
    async fn inspect_passes_records_through() -> anyhow::Result<()> {
        let mut inspect = InspectTransformer;
        let table = Record::Table(TableMetadata::new("hive", "c", "s", "t"));
        let lineage = Record::TableLineage(TableLineage {
            table_key: "hive://c.s/t".to_string(),
            downstream_deps: vec![],
        });

        assert_eq!(inspect.process(StreamItem::Data(table.clone())).await?, vec![table]);
        assert_eq!(inspect.transform(lineage.clone()).await?, vec![lineage]);
        assert!(inspect.process(StreamItem::EndOfStream).await?.is_empty());
        Ok(())
    }
}
