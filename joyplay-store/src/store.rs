//! Tiered snippet store

use crate::backend::{LocalBackend, MemoryBackend, SnippetBackend, UpstreamBackend};
use crate::config::StoreConfig;
use crate::error::{BackendError, StoreError};
use crate::id::SnippetId;
use crate::Result;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Writes to one primary backend, reads through an ordered list of tiers.
///
/// The primary is always the first tier. Resolution stops at the first tier
/// that returns the snippet; a tier failure of any kind only advances to the
/// next tier. Hits from later tiers are not copied into earlier ones.
#[derive(Clone)]
pub struct SnippetStore {
    primary: Arc<dyn SnippetBackend>,
    tiers: Vec<Arc<dyn SnippetBackend>>,
    max_snippet_bytes: usize,
}

impl SnippetStore {
    /// Store with a single tier, `primary`
    pub fn new(primary: impl SnippetBackend + 'static) -> Self {
        let primary: Arc<dyn SnippetBackend> = Arc::new(primary);
        Self {
            tiers: vec![Arc::clone(&primary)],
            primary,
            max_snippet_bytes: StoreConfig::default().max_snippet_bytes,
        }
    }

    /// Append a read-only fallback tier after the existing ones
    pub fn with_tier(mut self, backend: impl SnippetBackend + 'static) -> Self {
        self.tiers.push(Arc::new(backend));
        self
    }

    pub fn with_max_snippet_bytes(mut self, limit: usize) -> Self {
        self.max_snippet_bytes = limit;
        self
    }

    /// Build the tier chain described by `config`:
    /// s3 → local → upstream, with memory standing in when no persistent
    /// primary is configured
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let local = match &config.local_dir {
            Some(dir) => Some(LocalBackend::open(dir).await.map_err(|source| {
                StoreError::Backend {
                    backend: "local".to_string(),
                    source,
                }
            })?),
            None => None,
        };

        #[cfg(feature = "s3")]
        let s3 = match &config.s3 {
            Some(s3) => Some(crate::backend::S3Backend::from_config(s3).await),
            None => None,
        };
        #[cfg(not(feature = "s3"))]
        if config.s3.is_some() {
            return Err(StoreError::Config(
                "s3 tier configured but built without the s3 feature".to_string(),
            ));
        }

        #[cfg(feature = "s3")]
        let store = match (s3, local) {
            (Some(s3), Some(local)) => Self::new(s3).with_tier(local),
            (Some(s3), None) => Self::new(s3),
            (None, Some(local)) => Self::new(local),
            (None, None) => Self::new(MemoryBackend::new()),
        };
        #[cfg(not(feature = "s3"))]
        let store = match local {
            Some(local) => Self::new(local),
            None => Self::new(MemoryBackend::new()),
        };

        let mut store = store.with_max_snippet_bytes(config.max_snippet_bytes);
        if let Some(upstream) = &config.upstream {
            store = store.with_tier(UpstreamBackend::new(upstream)?);
        }

        info!(tiers = ?store.tier_names(), "Snippet store ready");
        Ok(store)
    }

    pub fn max_snippet_bytes(&self) -> usize {
        self.max_snippet_bytes
    }

    /// Names of the tiers in resolution order
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Persist `body` in the primary tier and return its id.
    ///
    /// Idempotent: the same bytes always map to the same id.
    pub async fn store(&self, body: &[u8]) -> Result<SnippetId> {
        if body.len() > self.max_snippet_bytes {
            return Err(StoreError::TooLarge {
                size: body.len(),
                limit: self.max_snippet_bytes,
            });
        }

        let id = SnippetId::for_body(body);
        self.primary
            .put(&id, Bytes::copy_from_slice(body))
            .await
            .map_err(|source| {
                warn!(snippet_id = %id, tier = self.primary.name(), error = %source, "Couldn't store snippet");
                StoreError::Backend {
                    backend: self.primary.name().to_string(),
                    source,
                }
            })?;

        debug!(snippet_id = %id, size = body.len(), tier = self.primary.name(), "Stored snippet");
        Ok(id)
    }

    /// Find the body for `id`, consulting tiers in order
    pub async fn resolve(&self, id: &str) -> Result<Bytes> {
        let id = SnippetId::parse(id)?;

        let mut last = (String::from("none"), BackendError::NotFound);
        for tier in &self.tiers {
            match tier.get(&id).await {
                Ok(body) => {
                    debug!(snippet_id = %id, tier = tier.name(), "Resolved snippet");
                    return Ok(body);
                }
                Err(BackendError::NotFound) => {
                    debug!(snippet_id = %id, tier = tier.name(), "Snippet not in tier");
                    last = (tier.name().to_string(), BackendError::NotFound);
                }
                Err(e) => {
                    warn!(snippet_id = %id, tier = tier.name(), error = %e, "Tier lookup failed");
                    last = (tier.name().to_string(), e);
                }
            }
        }

        let (tier, last) = last;
        Err(StoreError::NotFound {
            id: id.to_string(),
            tier,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tier that always fails and counts how often it was asked
    #[derive(Default)]
    struct BrokenBackend {
        gets: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SnippetBackend for BrokenBackend {
        async fn get(&self, _id: &SnippetId) -> std::result::Result<Bytes, BackendError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::ObjectStore("connection refused".to_string()))
        }

        async fn put(&self, _id: &SnippetId, _body: Bytes) -> std::result::Result<(), BackendError> {
            Err(BackendError::ObjectStore("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    /// Tier holding one fixed snippet
    struct FixedBackend(SnippetId, Bytes);

    #[async_trait]
    impl SnippetBackend for FixedBackend {
        async fn get(&self, id: &SnippetId) -> std::result::Result<Bytes, BackendError> {
            if *id == self.0 {
                Ok(self.1.clone())
            } else {
                Err(BackendError::NotFound)
            }
        }

        async fn put(&self, _id: &SnippetId, _body: Bytes) -> std::result::Result<(), BackendError> {
            Err(BackendError::ReadOnly)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = SnippetStore::new(MemoryBackend::new());
        for body in [&b""[..], b"package main\n", "héllo ☃".as_bytes()] {
            let id = store.store(body).await.unwrap();
            assert_eq!(store.resolve(id.as_str()).await.unwrap(), Bytes::copy_from_slice(body));
        }
    }

    #[tokio::test]
    async fn test_store_is_idempotent() {
        let store = SnippetStore::new(MemoryBackend::new());
        let first = store.store(b"package main").await.unwrap();
        let second = store.store(b"package main").await.unwrap();
        let other = store.store(b"package main\n").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_invalid_id_skips_tiers() {
        let broken = BrokenBackend::default();
        let gets = broken.gets.clone();
        let store = SnippetStore::new(broken);

        assert_matches!(store.resolve("short").await, Err(StoreError::InvalidId(_)));
        assert_matches!(store.resolve("abc$efghij").await, Err(StoreError::InvalidId(_)));
        assert_eq!(gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_tier_falls_through() {
        let id = SnippetId::for_body(b"from fallback");
        let store = SnippetStore::new(BrokenBackend::default())
            .with_tier(FixedBackend(id.clone(), Bytes::from_static(b"from fallback")));

        assert_eq!(
            store.resolve(id.as_str()).await.unwrap(),
            Bytes::from_static(b"from fallback")
        );
    }

    #[tokio::test]
    async fn test_first_hit_wins() {
        let id = SnippetId::for_body(b"primary copy");
        let primary = MemoryBackend::new();
        primary
            .put(&id, Bytes::from_static(b"primary copy"))
            .await
            .unwrap();
        let store = SnippetStore::new(primary)
            .with_tier(FixedBackend(id.clone(), Bytes::from_static(b"stale copy")));

        assert_eq!(
            store.resolve(id.as_str()).await.unwrap(),
            Bytes::from_static(b"primary copy")
        );
    }

    #[tokio::test]
    async fn test_not_found_carries_last_tier_error() {
        let store = SnippetStore::new(MemoryBackend::new()).with_tier(BrokenBackend::default());

        let err = store.resolve("AAAAAAAAAA").await.unwrap_err();
        assert_matches!(
            err,
            StoreError::NotFound { ref id, ref tier, last: BackendError::ObjectStore(_) }
                if id == "AAAAAAAAAA" && tier == "broken"
        );
        assert!(err.is_user_facing());
    }

    #[tokio::test]
    async fn test_upstream_hit_is_not_promoted() {
        let id = SnippetId::parse("IAAEPbTy59").unwrap();
        let primary = Arc::new(MemoryBackend::new());
        let primary_tier: Arc<dyn SnippetBackend> = primary.clone();
        let fallback: Arc<dyn SnippetBackend> =
            Arc::new(FixedBackend(id.clone(), Bytes::from_static(b"upstream")));
        let store = SnippetStore {
            primary: Arc::clone(&primary_tier),
            tiers: vec![primary_tier, fallback],
            max_snippet_bytes: 16,
        };

        store.resolve(id.as_str()).await.unwrap();
        assert!(primary.is_empty().await);
    }

    #[tokio::test]
    async fn test_size_limit() {
        let store = SnippetStore::new(MemoryBackend::new()).with_max_snippet_bytes(4);

        assert!(store.store(b"1234").await.is_ok());
        assert_matches!(
            store.store(b"12345").await,
            Err(StoreError::TooLarge { size: 5, limit: 4 })
        );
    }

    #[tokio::test]
    async fn test_primary_failure_surfaces() {
        let store = SnippetStore::new(BrokenBackend::default());
        let err = store.store(b"package main").await.unwrap_err();

        assert_matches!(err, StoreError::Backend { ref backend, .. } if backend == "broken");
        assert!(!err.is_user_facing());
    }

    #[tokio::test]
    async fn test_from_config_without_persistent_tiers() {
        let config = StoreConfig {
            upstream: None,
            ..Default::default()
        };
        let store = SnippetStore::from_config(&config).await.unwrap();
        assert_eq!(store.tier_names(), vec!["memory"]);
    }

    #[tokio::test]
    async fn test_from_config_local_then_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            local_dir: Some(dir.path().join("snippets")),
            ..Default::default()
        };
        let store = SnippetStore::from_config(&config).await.unwrap();
        assert_eq!(store.tier_names(), vec!["local", "upstream"]);

        let id = store.store(b"package main").await.unwrap();
        assert!(dir.path().join("snippets").join(id.as_str()).is_file());
    }
}
