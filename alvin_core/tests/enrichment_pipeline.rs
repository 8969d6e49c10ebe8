//! End-to-end tests for the enrichment pipeline.
//!
//! These tests verify that:
//! - Source records reach the loader unchanged and before any lineage
//! - Lineage records follow in batch order
//! - An unreachable lineage service still delivers every source record
//! - Cancelling enrichment fails the task but keeps the source records

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use alvin_core::{
    AlvinTransformer, BatchResponse, ChainedTransformer, ColumnMetadata, DashboardMetadata,
    EntityType, Error, Extractor, InspectTransformer, LineageApi, Loader, QueryObject, Record,
    TableLineage, TableMetadata, Task, TransformerSettings,
};
use async_trait::async_trait;
use serde_json::{Value, json};

struct VecExtractor(VecDeque<Record>);

#[async_trait]
impl Extractor for VecExtractor {
    async fn extract(&mut self) -> anyhow::Result<Option<Record>> {
        Ok(self.0.pop_front())
    }

    fn scope(&self) -> &str {
        "extractor.vec"
    }
}

#[derive(Clone, Default)]
struct CollectingLoader(Arc<Mutex<Vec<Record>>>);

impl CollectingLoader {
    fn records(&self) -> Vec<Record> {
        self.0.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Loader for CollectingLoader {
    async fn load(&mut self, record: &Record) -> anyhow::Result<()> {
        self.0
            .lock()
            .map_err(|_| anyhow::anyhow!("loader lock poisoned"))?
            .push(record.clone());
        Ok(())
    }

    fn scope(&self) -> &str {
        "loader.collecting"
    }
}

/// Returns `rows` for every call and remembers the batches it received.
#[derive(Default)]
struct FixedApi {
    rows: Vec<Value>,
    fail: bool,
    batches: Mutex<Vec<Vec<QueryObject>>>,
}

#[async_trait]
impl LineageApi for FixedApi {
    async fn fetch(&self, batch: &[QueryObject]) -> alvin_core::Result<BatchResponse> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(batch.to_vec());
        }
        if self.fail {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(BatchResponse::Rows(self.rows.clone()))
    }
}

fn settings() -> TransformerSettings {
    TransformerSettings::new("bq-prod", "bigquery").with_dashboard_site_name("analytics")
}

fn table(name: &str, columns: &[&str]) -> Record {
    let columns = columns
        .iter()
        .zip(0..)
        .map(|(column, order)| ColumnMetadata::new(*column, "STRING", order))
        .collect();
    Record::Table(TableMetadata::new("bigquery", "gold", "sales", name).with_columns(columns))
}

fn dashboard(id: &str) -> Record {
    Record::Dashboard(DashboardMetadata::new("tableau", "prod", "finance", id, id))
}

#[tokio::test]
async fn source_records_then_lineage() {
    let api = Arc::new(FixedApi {
        rows: vec![json!({"model": "TableLineage", "tableKey": "t1", "downstreamDeps": ["t2"]})],
        ..FixedApi::default()
    });
    let inputs = vec![table("t1", &["c1"]), dashboard("d1")];
    let loader = CollectingLoader::default();

    let transformer = AlvinTransformer::new(settings(), api.clone()).expect("valid settings");
    let report = Task::new(VecExtractor(inputs.clone().into()), transformer, loader.clone())
        .run()
        .await
        .expect("task succeeds");

    let mut expected = inputs;
    expected.push(Record::TableLineage(TableLineage {
        table_key: "t1".to_string(),
        downstream_deps: vec!["t2".to_string()],
    }));
    assert_eq!(loader.records(), expected);

    let batches = api.batches.lock().expect("lock").clone();
    assert_eq!(batches.len(), 1);
    let types: Vec<EntityType> = batches[0].iter().map(|q| q.entity_type).collect();
    assert_eq!(
        types,
        vec![EntityType::Table, EntityType::Column, EntityType::Workbook]
    );
    assert!(
        batches[0]
            .iter()
            .all(|q| q.dashboard_site_name.as_deref() == Some("analytics"))
    );

    let enrichment = report.enrichment.expect("enrichment stats");
    assert_eq!(enrichment.derived, 1);
    assert_eq!(report.loaded, 3);
}

#[tokio::test]
async fn twenty_three_entities_go_out_in_three_batches() {
    let api = Arc::new(FixedApi::default());
    let columns: Vec<String> = (0..21).map(|i| format!("c{i}")).collect();
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let inputs = vec![table("wide", &columns), dashboard("d1")];

    let transformer = AlvinTransformer::new(settings(), api.clone()).expect("valid settings");
    Task::new(
        VecExtractor(inputs.into()),
        transformer,
        CollectingLoader::default(),
    )
    .run()
    .await
    .expect("task succeeds");

    let sizes: Vec<usize> = api
        .batches
        .lock()
        .expect("lock")
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(sizes, vec![10, 10, 3]);
}

#[tokio::test]
async fn unreachable_service_still_delivers_source_records() {
    let api = Arc::new(FixedApi {
        fail: true,
        ..FixedApi::default()
    });
    let inputs = vec![table("t1", &["c1", "c2"]), dashboard("d1"), table("t2", &[])];
    let loader = CollectingLoader::default();

    let chain = ChainedTransformer::new()
        .with_stage(InspectTransformer)
        .with_stage(AlvinTransformer::new(settings(), api).expect("valid settings"));
    let report = Task::new(VecExtractor(inputs.clone().into()), chain, loader.clone())
        .run()
        .await
        .expect("transport failures are not fatal");

    assert_eq!(loader.records(), inputs);
    let enrichment = report.enrichment.expect("enrichment stats");
    assert!(enrichment.service_unreachable());
    assert_eq!(enrichment.derived, 0);
}

#[tokio::test]
async fn not_found_responses_yield_no_lineage() {
    struct NotFound;

    #[async_trait]
    impl LineageApi for NotFound {
        async fn fetch(&self, _batch: &[QueryObject]) -> alvin_core::Result<BatchResponse> {
            Ok(BatchResponse::from_body(r#"{"detail": "Not Found"}"#))
        }
    }

    let loader = CollectingLoader::default();
    let transformer = AlvinTransformer::new(settings(), Arc::new(NotFound)).expect("valid settings");
    let report = Task::new(
        VecExtractor(vec![dashboard("d1")].into()),
        transformer,
        loader.clone(),
    )
    .run()
    .await
    .expect("task succeeds");

    assert_eq!(loader.records(), vec![dashboard("d1")]);
    let enrichment = report.enrichment.expect("enrichment stats");
    assert_eq!(enrichment.empty_responses, 1);
    assert!(!enrichment.has_failures());
}

#[tokio::test]
async fn cancelled_enrichment_keeps_source_records() {
    let api = Arc::new(FixedApi::default());
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let loader = CollectingLoader::default();
    let inputs = vec![table("t1", &["c1"])];

    let transformer = AlvinTransformer::new(settings(), api)
        .expect("valid settings")
        .with_cancellation(cancel);
    let result = Task::new(VecExtractor(inputs.clone().into()), transformer, loader.clone())
        .run()
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(loader.records(), inputs);
}
