//! In-memory compile cache.
//!
//! Interactive editors re-derive SQL after every keystroke, often for a
//! descriptor that has not changed. [`CompileCache`] memoizes
//! [`render_sql`](crate::render::render_sql) output keyed by a content hash of
//! the descriptor and options.
//!
//! # Design
//!
//! - Keys are SHA-256 hashes of the JSON form (see [`cache_key`])
//! - Bounded: the least recently used entry is evicted once `capacity` is reached
//! - Compile errors are not cached

mod hash;
pub use hash::{cache_key, compute_hash};

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::compiler::{CompileError, CompileOptions};
use crate::model::QueryDescriptor;
use crate::render::render_sql;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 256;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to hash descriptor: {0}")]
    Hash(#[from] serde_json::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Hash-of-descriptor to SQL memo.
#[derive(Debug)]
pub struct CompileCache {
    /// `None` when caching is disabled.
    entries: Option<LruCache<String, String>>,
    stats: CacheStats,
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CompileCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Render `descriptor`, reusing a previous result for identical input.
    pub fn render(
        &mut self,
        descriptor: &QueryDescriptor,
        options: &CompileOptions,
    ) -> CacheResult<String> {
        let Some(entries) = self.entries.as_mut() else {
            return Ok(render_sql(descriptor, options)?);
        };

        let key = cache_key(descriptor, options)?;
        if let Some(sql) = entries.get(&key) {
            self.stats.hits += 1;
            tracing::trace!(key = %key, "compile cache hit");
            return Ok(sql.clone());
        }

        self.stats.misses += 1;
        let sql = render_sql(descriptor, options)?;
        // The key was just missed, so a returned pair is an evicted entry.
        if entries.push(key, sql.clone()).is_some() {
            self.stats.evictions += 1;
        }
        Ok(sql)
    }
}
