//! Metadata records flowing through the pipeline.
//!
//! Source records (tables, columns, dashboards) come from the extractor.
//! Derived records (dashboard/table links and lineage) are produced by the
//! enrichment pass.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Table(TableMetadata),
    Column(TableColumn),
    Dashboard(DashboardMetadata),
    DashboardTable(DashboardTable),
    TableLineage(TableLineage),
    ColumnLineage(ColumnLineage),
}

impl Record {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Column(_) => "column",
            Self::Dashboard(_) => "dashboard",
            Self::DashboardTable(_) => "dashboard_table",
            Self::TableLineage(_) => "table_lineage",
            Self::ColumnLineage(_) => "column_lineage",
        }
    }

    /// Stable identifying key of the record.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Table(table) => table.key(),
            Self::Column(column) => column.key(),
            Self::Dashboard(dashboard) => dashboard.key(),
            Self::DashboardTable(link) => link.key(),
            Self::TableLineage(lineage) => lineage.table_key.clone(),
            Self::ColumnLineage(lineage) => lineage.column_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub col_type: String,
    #[serde(default)]
    pub sort_order: u32,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, col_type: impl Into<String>, sort_order: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            col_type: col_type.into(),
            sort_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Columns in declared order.
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
    #[serde(default)]
    pub is_view: bool,
}

impl TableMetadata {
    pub fn new(
        database: impl Into<String>,
        cluster: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            cluster: cluster.into(),
            schema: schema.into(),
            name: name.into(),
            description: None,
            columns: Vec::new(),
            is_view: false,
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<ColumnMetadata>) -> Self {
        self.columns = columns;
        self
    }

    /// `{database}://{cluster}.{schema}/{table}`
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}://{}.{}/{}",
            self.database, self.cluster, self.schema, self.name
        )
    }

    /// `{database}://{cluster}.{schema}/{table}/{column}`
    #[must_use]
    pub fn column_key(&self, column: &ColumnMetadata) -> String {
        format!("{}/{}", self.key(), column.name)
    }
}

/// A column emitted on its own, owned by the table it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub table_key: String,
    pub column: ColumnMetadata,
}

impl TableColumn {
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.table_key, self.column.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub product: String,
    pub cluster: String,
    pub dashboard_group_id: String,
    pub dashboard_id: String,
    pub dashboard_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DashboardMetadata {
    pub fn new(
        product: impl Into<String>,
        cluster: impl Into<String>,
        dashboard_group_id: impl Into<String>,
        dashboard_id: impl Into<String>,
        dashboard_name: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            cluster: cluster.into(),
            dashboard_group_id: dashboard_group_id.into(),
            dashboard_id: dashboard_id.into(),
            dashboard_name: dashboard_name.into(),
            dashboard_group: None,
            description: None,
            url: None,
        }
    }

    /// `{product}_dashboard://{cluster}.{dashboard_group_id}/{dashboard_id}`
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}_dashboard://{}.{}/{}",
            self.product, self.cluster, self.dashboard_group_id, self.dashboard_id
        )
    }
}

/// Link between a dashboard and the tables it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTable {
    pub dashboard_group_id: String,
    pub dashboard_id: String,
    pub table_ids: Vec<String>,
    pub product: String,
    pub cluster: String,
}

impl DashboardTable {
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}_dashboard://{}.{}/{}",
            self.product, self.cluster, self.dashboard_group_id, self.dashboard_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLineage {
    pub table_key: String,
    pub downstream_deps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLineage {
    pub column_key: String,
    pub downstream_deps: Vec<String>,
}
