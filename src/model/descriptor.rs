//! The query descriptor owned by the editor.

use serde::{Deserialize, Serialize};

use super::parts::{ColumnSpec, GroupPart, WhereClausePart};
use super::target::QueryTarget;

/// Value the editor stores in optional selectors to mean "not set".
pub const NONE_SENTINEL: &str = "none";

/// Treat `None`, and `Some("none")`, as unset.
pub(crate) fn unless_sentinel(value: Option<&str>) -> Option<&str> {
    value.filter(|v| *v != NONE_SENTINEL)
}

/// Structured, UI-editable time-series query.
///
/// The host may mutate a descriptor freely between compilations; the
/// compiler only ever borrows it.
///
/// Deserializing goes through [`QueryTarget`], so any host JSON object is
/// accepted and missing fields get editor defaults. Serializing writes every
/// field explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "QueryTarget", rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub dataset: Option<String>,
    pub table: String,

    /// When set the host uses `raw_sql` verbatim and the compiler is bypassed.
    pub raw_query: bool,
    pub raw_sql: Option<String>,

    pub time_column: Option<String>,
    /// Reserved; does not affect generated SQL.
    pub time_column_type: Option<String>,
    /// May hold the `"none"` sentinel.
    pub metric_column: Option<String>,

    pub select: Vec<ColumnSpec>,
    #[serde(rename = "where")]
    pub where_parts: Vec<WhereClausePart>,
    pub group: Vec<GroupPart>,
}

impl QueryDescriptor {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Parse a host JSON target, applying editor defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The metric column, with the `"none"` sentinel treated as unset.
    pub fn metric_column(&self) -> Option<&str> {
        unless_sentinel(self.metric_column.as_deref())
    }

    pub fn has_metric_column(&self) -> bool {
        self.metric_column().is_some()
    }

    /// The first time-bucketing group part, if any.
    pub fn time_group(&self) -> Option<&GroupPart> {
        self.group
            .iter()
            .find(|g| matches!(g, GroupPart::Time { .. }))
    }

    pub fn with_dataset(mut self, dataset: &str) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_time_column(mut self, column: &str) -> Self {
        self.time_column = Some(column.into());
        self
    }

    pub fn with_metric_column(mut self, column: &str) -> Self {
        self.metric_column = Some(column.into());
        self
    }

    pub fn with_select(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.select = columns;
        self
    }

    pub fn with_where(mut self, parts: Vec<WhereClausePart>) -> Self {
        self.where_parts = parts;
        self
    }

    pub fn with_group(mut self, parts: Vec<GroupPart>) -> Self {
        self.group = parts;
        self
    }

    pub fn with_raw_sql(mut self, sql: &str) -> Self {
        self.raw_query = true;
        self.raw_sql = Some(sql.into());
        self
    }
}
