// chronovault-core/src/cache.rs
// ============================================================================
// Module: Identifier Cache
// Description: Write-through name-to-id map backing one dimension table.
// Purpose: Avoid a storage round trip for every dimension id resolution.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Each dimension table (attribute catalog, error strings, event strings)
//! gets one [`IdentifierCache`] mapping natural keys to their surrogate ids.
//! The cache is write-through and has no eviction: it grows to the
//! cardinality of its dimension, not with traffic volume. Membership checks
//! never touch storage; the gateway resolves misses with a single
//! read-through query and caches the result, so the cache is a correctness
//! aid, not a performance bound.
//!
//! A key that is re-inserted with a different id signals an unresolved
//! divergence between the cache and storage; the insert fails rather than
//! overwriting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier cache errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The key has no cached id.
    #[error("{dimension} cache has no id for key: {key}")]
    Missing {
        /// Dimension label for diagnostics.
        dimension: String,
        /// The missing key.
        key: String,
    },
    /// The key is already cached under a different id.
    #[error("{dimension} cache conflict for key {key}: cached id {existing}, new id {incoming}")]
    Conflict {
        /// Dimension label for diagnostics.
        dimension: String,
        /// The conflicting key.
        key: String,
        /// Id already cached for the key.
        existing: i64,
        /// Id the caller attempted to cache.
        incoming: i64,
    },
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// In-memory write-through map from natural keys to surrogate ids.
#[derive(Debug, Clone)]
pub struct IdentifierCache {
    /// Dimension label used in diagnostics and errors.
    dimension: String,
    /// Cached key-to-id entries.
    entries: HashMap<String, i64>,
}

impl IdentifierCache {
    /// Creates an empty cache for the named dimension.
    #[must_use]
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            entries: HashMap::new(),
        }
    }

    /// Returns the dimension label.
    #[must_use]
    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Returns true when the key has a cached id. Never touches storage.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the cached id for the key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Missing`] when the key is absent; callers check
    /// [`IdentifierCache::exists`] first or resolve the miss against storage.
    pub fn value(&self, key: &str) -> Result<i64, CacheError> {
        self.entries.get(key).copied().ok_or_else(|| CacheError::Missing {
            dimension: self.dimension.clone(),
            key: key.to_string(),
        })
    }

    /// Caches a newly resolved mapping.
    ///
    /// Re-inserting an identical pair is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Conflict`] when the key is already cached under
    /// a different id.
    pub fn insert(&mut self, id: i64, key: impl Into<String>) -> Result<(), CacheError> {
        let key = key.into();
        if let Some(existing) = self.entries.get(&key).copied() {
            if existing == id {
                return Ok(());
            }
            return Err(CacheError::Conflict {
                dimension: self.dimension.clone(),
                key,
                existing,
                incoming: id,
            });
        }
        self.entries.insert(key, id);
        Ok(())
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Called when the backing connection is replaced.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
