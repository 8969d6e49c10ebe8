#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

use async_trait::async_trait;

pub mod batch;
pub mod error;
pub mod query;
pub mod record;
pub mod response;
pub mod stats;
pub mod task;
pub mod transformer;

pub use batch::{BatchClient, DEFAULT_BATCH_SIZE, split_batches};
pub use error::{Error, InvalidRecord, Result};
pub use query::{EntityType, QueryBuilder, QueryObject};
pub use record::{
    ColumnLineage, ColumnMetadata, DashboardMetadata, DashboardTable, Record, TableColumn,
    TableLineage, TableMetadata,
};
pub use response::{BatchResponse, ResponseRow, map_response};
pub use stats::EnrichmentStats;
pub use task::{ErrorPolicy, Task, TaskReport};
pub use transformer::{
    AlvinTransformer, ChainedTransformer, InspectTransformer, StreamItem, Transformer,
    TransformerSettings,
};

/// Upstream pull interface: yields records until it returns `None`.
#[async_trait]
pub trait Extractor: Send {
    async fn extract(&mut self) -> anyhow::Result<Option<Record>>;

    /// Release any resources held by the extractor.
    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn scope(&self) -> &str;
}

/// Downstream push interface.
#[async_trait]
pub trait Loader: Send {
    async fn load(&mut self, record: &Record) -> anyhow::Result<()>;

    /// Flush and release any resources held by the loader.
    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn scope(&self) -> &str;
}

/// Lineage lookup service.
///
/// One call carries one batch of query objects. Implementations return
/// `Err` only when the service could not be reached or answered with an
/// unexpected status; every body the service does return is classified by
/// [`BatchResponse::from_body`].
#[async_trait]
pub trait LineageApi: Send + Sync {
    async fn fetch(&self, batch: &[QueryObject]) -> Result<BatchResponse>;
}
