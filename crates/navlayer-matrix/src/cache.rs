//! Built-matrix cache using moka
//!
//! Matrices are keyed by `(edition, domain)` and shared as `Arc<Matrix>`.
//! Readers never mutate a cached matrix; ordering and layout produce fresh
//! values per export.

use crate::builder::MatrixBuilder;
use crate::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use crate::source::FrameworkSource;
use moka::sync::Cache;
use navlayer_model::Domain;
use std::sync::Arc;

/// Cache key: framework edition plus domain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatrixKey {
    pub edition: String,
    pub domain: Domain,
}

impl MatrixKey {
    pub fn new(edition: impl Into<String>, domain: Domain) -> Self {
        Self {
            edition: edition.into(),
            domain,
        }
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Concurrent cache of built matrices
#[derive(Debug, Clone)]
pub struct MatrixCache {
    inner: Cache<MatrixKey, Arc<Matrix>>,
    builder: MatrixBuilder,
}

impl MatrixCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            builder: MatrixBuilder::new(),
        }
    }

    /// Cached matrix for a key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &MatrixKey) -> Option<Arc<Matrix>> {
        self.inner.get(key)
    }

    /// Matrix for the source's edition and `domain`, building it on a miss
    ///
    /// Concurrent callers for the same key wait for a single build.
    ///
    /// # Errors
    /// Returns the builder's error, with its variant kept even when several
    /// callers waited on the failed build; nothing is cached in that case.
    pub fn get_or_build(&self, source: &dyn FrameworkSource, domain: Domain) -> MatrixResult<Arc<Matrix>> {
        let key = MatrixKey::new(source.edition(), domain);
        self.inner
            .try_get_with(key.clone(), || {
                tracing::debug!(edition = %key.edition, domain = %domain, "matrix cache miss");
                self.builder.build(source, domain).map(Arc::new)
            })
            .map_err(|shared| Arc::try_unwrap(shared).unwrap_or_else(|shared| unshare(&shared)))
    }

    /// Invalidate a cache entry
    #[inline]
    pub fn invalidate(&self, key: &MatrixKey) {
        self.inner.invalidate(key);
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

/// Copy of an error still held by other waiters
fn unshare(err: &MatrixError) -> MatrixError {
    match err {
        MatrixError::Source(msg) => MatrixError::Source(msg.clone()),
        MatrixError::Json(e) => MatrixError::Json(serde::de::Error::custom(e)),
        MatrixError::Io { path, source } => {
            MatrixError::io_error(path.clone(), std::io::Error::new(source.kind(), source.to_string()))
        }
        MatrixError::NoMatrix { domain, edition } => MatrixError::NoMatrix {
            domain: *domain,
            edition: edition.clone(),
        },
        MatrixError::MalformedObject { id, reason } => MatrixError::malformed(id.clone(), reason.clone()),
    }
}

impl Default for MatrixCache {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockFrameworkSource;

    fn failing_source() -> MockFrameworkSource {
        let mut source = MockFrameworkSource::new();
        source.expect_edition().return_const("e1".to_string());
        source.expect_query().returning(|_| Err(MatrixError::source("offline")));
        source
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = MatrixCache::default();
        let source = failing_source();
        assert!(cache.get_or_build(&source, Domain::Enterprise).is_err());
        assert!(cache.get(&MatrixKey::new("e1", Domain::Enterprise)).is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn build_error_keeps_its_variant() {
        let mut source = MockFrameworkSource::new();
        source.expect_edition().return_const("e2".to_string());
        source.expect_query().returning(|_| {
            Err(MatrixError::NoMatrix {
                domain: Domain::Mobile,
                edition: "e2".into(),
            })
        });
        let cache = MatrixCache::default();
        assert!(matches!(
            cache.get_or_build(&source, Domain::Mobile),
            Err(MatrixError::NoMatrix { domain: Domain::Mobile, .. })
        ));
    }

    #[test]
    fn unshared_copies_keep_variant_and_message() {
        let io = MatrixError::io_error("bundle.json", std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        match unshare(&io) {
            MatrixError::Io { path, source } => {
                assert_eq!(path, std::path::PathBuf::from("bundle.json"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}"),
        }

        let json = MatrixError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        let copy = unshare(&json);
        assert!(matches!(copy, MatrixError::Json(_)));
        assert!(copy.to_string().contains("EOF"));

        let malformed = MatrixError::malformed("attack-pattern--1", "no id");
        assert_eq!(unshare(&malformed).to_string(), malformed.to_string());
    }

    #[test]
    fn invalidate_removes_one_entry() {
        let cache = MatrixCache::default();
        let key = MatrixKey::new("e3", Domain::Enterprise);
        cache.inner.insert(
            key.clone(),
            Arc::new(Matrix {
                domain: Domain::Enterprise,
                edition: "e3".into(),
                columns: Vec::new(),
            }),
        );
        assert!(cache.get(&key).is_some());
        cache.invalidate(&key);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn key_equality() {
        assert_eq!(
            MatrixKey::new("e1", Domain::Mobile),
            MatrixKey::new("e1".to_string(), Domain::Mobile)
        );
        assert_ne!(MatrixKey::new("e1", Domain::Mobile), MatrixKey::new("e1", Domain::Enterprise));
    }
}
