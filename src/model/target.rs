//! Host-facing query target and its normalization.

use serde::{Deserialize, Serialize};

use super::descriptor::QueryDescriptor;
use super::parts::{ColumnSpec, GroupPart, WhereClausePart};

/// The query object as the host stores it: every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTarget {
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub raw_query: Option<bool>,
    #[serde(default)]
    pub raw_sql: Option<String>,
    #[serde(default)]
    pub time_column: Option<String>,
    #[serde(default)]
    pub time_column_type: Option<String>,
    #[serde(default)]
    pub metric_column: Option<String>,
    #[serde(default)]
    pub select: Option<Vec<ColumnSpec>>,
    #[serde(default, rename = "where")]
    pub where_parts: Option<Vec<WhereClausePart>>,
    #[serde(default)]
    pub group: Option<Vec<GroupPart>>,
}

impl From<QueryTarget> for QueryDescriptor {
    fn from(target: QueryTarget) -> Self {
        // Targets saved before the visual builder existed only carry raw SQL.
        let raw_query = target.raw_query.unwrap_or(target.raw_sql.is_some());

        QueryDescriptor {
            dataset: target.dataset,
            table: target.table.unwrap_or_default(),
            raw_query,
            raw_sql: target.raw_sql,
            time_column: target.time_column,
            time_column_type: target.time_column_type,
            metric_column: target.metric_column,
            select: target
                .select
                .unwrap_or_else(|| vec![ColumnSpec::column("value")]),
            where_parts: target
                .where_parts
                .unwrap_or_else(|| vec![WhereClausePart::time_filter()]),
            group: target.group.unwrap_or_default(),
        }
    }
}
