//! Lineage service responses and their mapping back to records.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{ColumnLineage, DashboardTable, Record, TableLineage};

/// Literal cluster assigned to every derived dashboard/table link.
pub const DASHBOARD_TABLE_CLUSTER: &str = "None";

/// Classified body of one batch call.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResponse {
    /// The body was a JSON array; one element per row.
    Rows(Vec<Value>),
    /// The body was valid JSON but not an array, e.g. `{"detail": "Not Found"}`.
    NotList(Value),
    /// The body was not valid JSON.
    Undecodable(String),
}

impl BatchResponse {
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(rows)) => Self::Rows(rows),
            Ok(other) => Self::NotList(other),
            Err(e) => Self::Undecodable(e.to_string()),
        }
    }
}

/// One response row, discriminated by its `model` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "model")]
pub enum ResponseRow {
    #[serde(rename_all = "camelCase")]
    DashboardTable {
        dashboard_group_id: String,
        dashboard_id: String,
        #[serde(default)]
        table_ids: Option<Vec<String>>,
        #[serde(default)]
        product: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TableLineage {
        table_key: String,
        #[serde(default)]
        downstream_deps: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    ColumnLineage {
        column_key: String,
        #[serde(default)]
        downstream_deps: Option<Vec<String>>,
    },
    #[serde(other)]
    Unknown,
}

impl ResponseRow {
    /// Rows that cannot be decoded (missing `model`, missing key fields)
    /// become [`ResponseRow::Unknown`].
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            debug!("Undecodable response row treated as unknown: {e}");
            Self::Unknown
        })
    }
}

/// Map a response row to the derived record it describes, if any.
#[must_use]
pub fn map_response(row: ResponseRow) -> Option<Record> {
    match row {
        ResponseRow::DashboardTable {
            dashboard_group_id,
            dashboard_id,
            table_ids,
            product,
        } => Some(Record::DashboardTable(DashboardTable {
            dashboard_group_id,
            dashboard_id,
            table_ids: table_ids.unwrap_or_default(),
            product: product.unwrap_or_default(),
            cluster: DASHBOARD_TABLE_CLUSTER.to_string(),
        })),
        ResponseRow::TableLineage {
            table_key,
            downstream_deps,
        } => Some(Record::TableLineage(TableLineage {
            table_key,
            downstream_deps: downstream_deps.unwrap_or_default(),
        })),
        ResponseRow::ColumnLineage {
            column_key,
            downstream_deps,
        } => Some(Record::ColumnLineage(ColumnLineage {
            column_key,
            downstream_deps: downstream_deps.unwrap_or_default(),
        })),
        ResponseRow::Unknown => None,
    }
}
