//! Lookup requests derived from source records.

use serde::{Deserialize, Serialize};

use crate::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Table,
    Column,
    Workbook,
}

/// One entity submitted to the lineage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryObject {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub platform_id: String,
    pub platform_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_site_name: Option<String>,
}

/// Maps source records to query objects for one configured platform.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    platform_id: String,
    platform_type: String,
    dashboard_site_name: Option<String>,
}

impl QueryBuilder {
    /// An empty site name counts as no site name.
    pub fn new(
        platform_id: impl Into<String>,
        platform_type: impl Into<String>,
        dashboard_site_name: Option<String>,
    ) -> Self {
        Self {
            platform_id: platform_id.into(),
            platform_type: platform_type.into(),
            dashboard_site_name: dashboard_site_name.filter(|site| !site.is_empty()),
        }
    }

    fn query(&self, entity_id: String, entity_type: EntityType) -> QueryObject {
        QueryObject {
            entity_id,
            entity_type,
            platform_id: self.platform_id.clone(),
            platform_type: self.platform_type.clone(),
            dashboard_site_name: self.dashboard_site_name.clone(),
        }
    }

    /// Tables yield one TABLE object followed by one COLUMN object per column
    /// in declared order; dashboards yield one WORKBOOK object; everything
    /// else yields nothing.
    #[must_use]
    pub fn build(&self, record: &Record) -> Vec<QueryObject> {
        match record {
            Record::Table(table) => std::iter::once(self.query(table.key(), EntityType::Table))
                .chain(
                    table
                        .columns
                        .iter()
                        .map(|column| self.query(table.column_key(column), EntityType::Column)),
                )
                .collect(),
            Record::Dashboard(dashboard) => {
                vec![self.query(dashboard.key(), EntityType::Workbook)]
            }
            Record::Column(_)
            | Record::DashboardTable(_)
            | Record::TableLineage(_)
            | Record::ColumnLineage(_) => Vec::new(),
        }
    }

    /// Concatenate the query objects of every record, preserving order.
    #[must_use]
    pub fn build_all<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Vec<QueryObject> {
        records
            .into_iter()
            .flat_map(|record| self.build(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnMetadata, DashboardMetadata, TableColumn, TableLineage, TableMetadata};

    fn builder(site: Option<&str>) -> QueryBuilder {
        QueryBuilder::new("bq-prod", "bigquery", site.map(str::to_string))
    }

    fn table_with_columns(columns: &[&str]) -> Record {
        let columns = columns
            .iter()
            .zip(0..)
            .map(|(name, order)| ColumnMetadata::new(*name, "STRING", order))
            .collect();
        Record::Table(TableMetadata::new("bigquery", "gold", "sales", "orders").with_columns(columns))
    }

    #[test]
    fn table_and_dashboard_yield_five_objects_in_order() {
        let records = vec![
            table_with_columns(&["a", "b", "c"]),
            Record::Dashboard(DashboardMetadata::new("tableau", "prod", "g", "d", "Dash")),
        ];

        let queries = builder(None).build_all(&records);
        let types: Vec<EntityType> = queries.iter().map(|q| q.entity_type).collect();

        assert_eq!(
            types,
            vec![
                EntityType::Table,
                EntityType::Column,
                EntityType::Column,
                EntityType::Column,
                EntityType::Workbook,
            ]
        );
        assert_eq!(queries[0].entity_id, "bigquery://gold.sales/orders");
        assert_eq!(queries[1].entity_id, "bigquery://gold.sales/orders/a");
        assert_eq!(queries[3].entity_id, "bigquery://gold.sales/orders/c");
        assert_eq!(queries[4].entity_id, "tableau_dashboard://prod.g/d");
    }

    #[test]
    fn every_object_carries_platform_settings() {
        let queries = builder(Some("site-a")).build(&table_with_columns(&["a"]));

        assert_eq!(queries.len(), 2);
        for query in &queries {
            assert_eq!(query.platform_id, "bq-prod");
            assert_eq!(query.platform_type, "bigquery");
            assert_eq!(query.dashboard_site_name.as_deref(), Some("site-a"));
        }
    }

    #[test]
    fn empty_site_name_is_omitted_from_the_wire() -> anyhow::Result<()> {
        let queries = builder(Some("")).build(&table_with_columns(&[]));
        let json = serde_json::to_value(&queries[0])?;

        assert_eq!(json["entity_type"], "TABLE");
        assert!(json.get("dashboard_site_name").is_none());
        Ok(())
    }

    #[test]
    fn other_records_yield_nothing() {
        let b = builder(None);
        let column = Record::Column(TableColumn {
            table_key: "bigquery://gold.sales/orders".to_string(),
            column: ColumnMetadata::new("id", "INT64", 0),
        });
        let lineage = Record::TableLineage(TableLineage {
            table_key: "t".to_string(),
            downstream_deps: vec![],
        });

        assert!(b.build(&column).is_empty());
        assert!(b.build(&lineage).is_empty());
    }
}
