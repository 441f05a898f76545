//! Structured query descriptors.
//!
//! A [`QueryDescriptor`] is the editor-owned representation of a time-series
//! query. It is built either directly in Rust or deserialized from the host's
//! loosely-shaped JSON target (see [`QueryTarget`]), which fills in the same
//! defaults the editor applies to a freshly created query.

mod descriptor;
mod parts;
mod target;

pub use descriptor::{QueryDescriptor, NONE_SENTINEL};
pub use parts::{
    ColumnPart, ColumnSpec, DescriptorError, GroupPart, WhereClausePart, WhereMacro, WindowKind,
};
pub use target::QueryTarget;
