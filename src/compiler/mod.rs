//! Descriptor to SQL compilation.
//!
//! [`QueryCompiler`] borrows a [`QueryDescriptor`] and renders each clause of
//! the statement independently; [`QueryCompiler::build_query`] stitches them
//! together:
//!
//! ```text
//! #standardSQL
//! SELECT
//!  <time column>,
//!   <metric column>,
//!   <value column>, ...
//! FROM <dataset>.<table>
//! WHERE ...
//! GROUP BY 1[,2]
//! ORDER BY 1[,2]
//! ```
//!
//! # Example
//!
//! ```
//! use bqcompile::compiler::QueryCompiler;
//! use bqcompile::model::{ColumnSpec, QueryDescriptor};
//!
//! let desc = QueryDescriptor::new("table")
//!     .with_time_column("t")
//!     .with_select(vec![ColumnSpec::column("value")]);
//!
//! let sql = QueryCompiler::new(&desc).build_query().unwrap();
//! assert_eq!(sql, "#standardSQL\nSELECT\n t AS time,\n  value\nFROM undefined.table\nORDER BY 1");
//! ```

mod clauses;
mod error;
mod value;

pub use error::{CompileError, CompileResult, ShapeError};

use serde::{Deserialize, Serialize};

use crate::model::{ColumnSpec, QueryDescriptor};
use crate::sql::token::{Token, TokenStream};

use value::{ColumnShape, ValueContext};

// ============================================================================
// Options
// ============================================================================

/// Placeholder text emitted for unset descriptor values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Printed wherever the time column is needed but unset.
    pub time_placeholder: String,

    /// Printed in `FROM` when the dataset is unset.
    pub dataset_placeholder: String,

    /// Printed in `ROWS <n> PRECEDING` when a moving window has no size.
    pub rows_placeholder: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            time_placeholder: "-- time --".to_string(),
            dataset_placeholder: "undefined".to_string(),
            rows_placeholder: "undefined".to_string(),
        }
    }
}

impl CompileOptions {
    pub fn with_time_placeholder(mut self, text: &str) -> Self {
        self.time_placeholder = text.into();
        self
    }

    pub fn with_dataset_placeholder(mut self, text: &str) -> Self {
        self.dataset_placeholder = text.into();
        self
    }

    pub fn with_rows_placeholder(mut self, text: &str) -> Self {
        self.rows_placeholder = text.into();
        self
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Renders a borrowed descriptor to SQL.
///
/// Every builder is a pure function of the descriptor and options; a host
/// re-deriving SQL after each edit just constructs a new compiler.
#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    descriptor: &'a QueryDescriptor,
    options: CompileOptions,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(descriptor: &'a QueryDescriptor) -> Self {
        Self::with_options(descriptor, CompileOptions::default())
    }

    pub fn with_options(descriptor: &'a QueryDescriptor, options: CompileOptions) -> Self {
        Self {
            descriptor,
            options,
        }
    }

    /// The time column, or the placeholder when unset.
    fn time_column(&self) -> &str {
        self.descriptor
            .time_column
            .as_deref()
            .unwrap_or(&self.options.time_placeholder)
    }

    fn value_context(&self) -> ValueContext<'_> {
        ValueContext {
            time_column: self.time_column(),
            metric_column: self.descriptor.metric_column(),
            rows_placeholder: &self.options.rows_placeholder,
        }
    }

    /// Render one value column.
    ///
    /// Reducers are applied before window computations regardless of the
    /// order the parts appear in.
    pub fn build_value_column(&self, column: &ColumnSpec) -> CompileResult<String> {
        Ok(self.value_column_tokens(column)?.serialize())
    }

    fn value_column_tokens(&self, column: &ColumnSpec) -> CompileResult<TokenStream> {
        let shape = ColumnShape::from_spec(column)?;
        tracing::trace!(parts = column.parts().len(), "value column");
        Ok(shape.render(&self.value_context()))
    }

    /// Render the full statement.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %self.descriptor.table))]
    pub fn build_query(&self) -> CompileResult<String> {
        let mut ts = TokenStream::new();
        ts.push(Token::StandardSql)
            .newline()
            .push(Token::Select)
            .newline()
            .space()
            .append(&self.time_column_tokens(true));

        if let Some(metric) = self.metric_column_tokens() {
            ts.comma().newline().indent(1).append(&metric);
        }

        for (index, column) in self.descriptor.select.iter().enumerate() {
            let value = self
                .value_column_tokens(column)
                .map_err(|e| e.at_column(index))?;
            ts.comma().newline().indent(1).append(&value);
        }

        ts.newline()
            .push(Token::From)
            .space()
            .append(&self.table_tokens())
            .append(&self.where_clause_tokens())
            .append(&self.group_clause_tokens())
            .append(&self.order_clause_tokens());

        let sql = ts.serialize();
        tracing::debug!(
            columns = self.descriptor.select.len(),
            bytes = sql.len(),
            "compiled query"
        );
        Ok(sql)
    }

    /// `<dataset>.<table>`
    fn table_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match &self.descriptor.dataset {
            Some(dataset) => ts.push(Token::Ident(dataset.clone())),
            None => {
                // Yields a table path the engine will reject.
                tracing::warn!(
                    table = %self.descriptor.table,
                    placeholder = %self.options.dataset_placeholder,
                    "dataset is unset, emitting placeholder"
                );
                ts.raw(&self.options.dataset_placeholder)
            }
        };
        ts.push(Token::Dot)
            .push(Token::Ident(self.descriptor.table.clone()));
        ts
    }
}

/// Compile `descriptor` to SQL, ignoring the raw-query flag.
pub fn compile(descriptor: &QueryDescriptor, options: &CompileOptions) -> CompileResult<String> {
    QueryCompiler::with_options(descriptor, options.clone()).build_query()
}
