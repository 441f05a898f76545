//! # bqcompile
//!
//! Compiles structured time-series query descriptors to BigQuery standard SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Host target (JSON, every field optional)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │   QueryDescriptor (select / where / group parts)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [render: raw SQL bypass]
//! ┌─────────────────────────────────────────────────────────┐
//! │   QueryCompiler: time, metric, value, where, group,      │
//! │   order clause builders                                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::token]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SQL string with engine macros ($__timeFilter, ...)     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Engine macros are left in the output for the query engine's own
//! expansion pass. Column and table names are emitted verbatim.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod model;
pub mod render;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cache::{CacheError, CompileCache};
    pub use crate::compiler::{
        compile, CompileError, CompileOptions, CompileResult, QueryCompiler, ShapeError,
    };
    pub use crate::model::{
        ColumnPart, ColumnSpec, GroupPart, QueryDescriptor, QueryTarget, WhereClausePart,
        WindowKind,
    };
    pub use crate::render::render_sql;
    pub use crate::sql::escape_literal;
}

// Also export at crate root for convenience
pub use compiler::{compile, CompileError, CompileOptions, QueryCompiler};
pub use model::QueryDescriptor;
pub use render::render_sql;
pub use sql::escape_literal;
