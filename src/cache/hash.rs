//! Content hashing for compile cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::compiler::CompileOptions;
use crate::model::QueryDescriptor;

/// Bump when the generated SQL changes for an unchanged descriptor.
const KEY_VERSION: u8 = 1;

/// SHA-256 of the JSON form of `value`, as 64 lowercase hex characters.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update([KEY_VERSION]);
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Key identifying one compilation: the descriptor plus the placeholders
/// it would be rendered with.
pub fn cache_key(
    descriptor: &QueryDescriptor,
    options: &CompileOptions,
) -> Result<String, serde_json::Error> {
    compute_hash(&(descriptor, options))
}
