//! Host entry point: raw SQL bypass or compilation.

use crate::compiler::{self, CompileOptions, CompileResult};
use crate::model::QueryDescriptor;

/// SQL the host should execute for `descriptor`.
///
/// Raw-mode descriptors return their `raw_sql` untouched (empty when absent)
/// and the compiler is never invoked.
pub fn render_sql(descriptor: &QueryDescriptor, options: &CompileOptions) -> CompileResult<String> {
    if descriptor.raw_query {
        tracing::debug!("raw query, skipping compilation");
        return Ok(descriptor.raw_sql.clone().unwrap_or_default());
    }
    compiler::compile(descriptor, options)
}
