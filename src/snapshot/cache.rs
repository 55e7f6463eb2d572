//! Cached snapshot + TTL (C5). The double-checked-locking refresh pattern
//! here mirrors the fast-path-read / serialized-refresh-on-miss shape used
//! for TTL-bound indices elsewhere in the corpus: a cheap read-lock check,
//! then a dedicated mutex so concurrent misses don't trigger parallel
//! reloads.

use super::loader::{SnapshotLoadError, SnapshotLoader};
use super::Snapshot;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

pub const CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Default)]
pub struct Health {
    pub degraded: bool,
    pub reason: Option<String>,
    pub failure_count: u64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

struct Inner {
    snapshot: Arc<Snapshot>,
    force_next_refresh: bool,
    health: Health,
}

pub struct CachedSnapshot {
    inner: RwLock<Inner>,
    refresh_guard: Mutex<()>,
    loader: SnapshotLoader,
    ttl: Duration,
}

impl CachedSnapshot {
    pub fn new(loader: SnapshotLoader) -> Self {
        Self::with_ttl(loader, Duration::from_secs(CACHE_TTL_SECONDS))
    }

    pub fn with_ttl(loader: SnapshotLoader, ttl: Duration) -> Self {
        CachedSnapshot {
            inner: RwLock::new(Inner {
                snapshot: Arc::new(Snapshot::empty()),
                force_next_refresh: true,
                health: Health::default(),
            }),
            refresh_guard: Mutex::new(()),
            loader,
            ttl,
        }
    }

    fn is_expired(inner: &Inner, ttl: Duration) -> bool {
        inner.force_next_refresh
            || inner.snapshot.teams.is_empty()
            || inner.snapshot.loaded_at.elapsed() >= ttl
    }

    /// The hot path every query primitive goes through: returns a fresh
    /// snapshot, refreshing first if expired. On refresh failure the prior
    /// snapshot (possibly empty, possibly stale) is returned and health is
    /// marked degraded.
    pub async fn ensure_cache(&self) -> Arc<Snapshot> {
        {
            let guard = self.inner.read().await;
            if !Self::is_expired(&guard, self.ttl) {
                return guard.snapshot.clone();
            }
        }

        let _refresh_lock = self.refresh_guard.lock().await;
        {
            let guard = self.inner.read().await;
            if !Self::is_expired(&guard, self.ttl) {
                return guard.snapshot.clone();
            }
        }

        self.reload().await
    }

    async fn reload(&self) -> Arc<Snapshot> {
        match self.loader.load().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let mut guard = self.inner.write().await;
                guard.snapshot = snapshot.clone();
                guard.force_next_refresh = false;
                guard.health.degraded = false;
                guard.health.reason = None;
                guard.health.last_success_at = Some(Utc::now());
                snapshot
            }
            Err(err) => {
                warn!(error = %err, "snapshot refresh failed, serving stale data");
                let mut guard = self.inner.write().await;
                guard.health.degraded = true;
                guard.health.reason = Some(err.to_string());
                guard.health.failure_count += 1;
                guard.health.last_error = Some(err.to_string());
                guard.health.last_error_at = Some(Utc::now());
                // force_next_refresh is deliberately left set (or set here) so the
                // next read retries rather than serving the same failure silently.
                guard.force_next_refresh = true;
                guard.snapshot.clone()
            }
        }
    }

    /// Invoked by the router after a successful remote write.
    pub async fn mark_stale(&self) {
        self.inner.write().await.force_next_refresh = true;
    }

    /// Public refresh entry point. `force=true` bypasses the TTL check.
    pub async fn refresh_cache(&self, force: bool) -> Health {
        if force {
            self.mark_stale().await;
        }
        self.ensure_cache().await;
        self.inner.read().await.health.clone()
    }

    pub async fn health(&self) -> Health {
        self.inner.read().await.health.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::scope::ScopeConfig;
    use crate::snapshot::store::{CrdtDecoder, ObjectStoreDatabase};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDb {
        calls: AtomicUsize,
        stores: HashMap<String, Vec<crate::model::AttributeMap>>,
    }

    #[async_trait]
    impl ObjectStoreDatabase for CountingDb {
        fn object_store_names(&self) -> Vec<String> {
            self.stores.keys().cloned().collect()
        }
        async fn sample_records(&self, store_name: &str, limit: usize) -> anyhow::Result<Vec<crate::model::AttributeMap>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.stores.get(store_name).cloned().unwrap_or_default().into_iter().take(limit).collect())
        }
        async fn all_records(&self, store_name: &str) -> anyhow::Result<Vec<crate::model::AttributeMap>> {
            Ok(self.stores.get(store_name).cloned().unwrap_or_default())
        }
    }

    struct NoopDecoder;
    impl CrdtDecoder for NoopDecoder {
        fn decode(&self, _blob: &Value) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn expired_snapshot_triggers_refresh_only_once_under_contention() {
        let mut stores = HashMap::new();
        stores.insert(
            "teams".to_string(),
            vec![serde_json::json!({"id": "T1", "key": "ENG", "name": "Engineering"}).as_object().unwrap().clone()],
        );
        let db = Arc::new(CountingDb { calls: AtomicUsize::new(0), stores });
        let loader = SnapshotLoader::new(db, Arc::new(NoopDecoder), Option::<ScopeConfig>::None);
        let cache = Arc::new(CachedSnapshot::new(loader));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.ensure_cache().await }));
        }
        for h in handles {
            let snap = h.await.unwrap();
            assert!(snap.teams.contains_key("T1"));
        }
    }

    #[tokio::test]
    async fn ttl_boundary() {
        let mut stores = HashMap::new();
        stores.insert(
            "teams".to_string(),
            vec![serde_json::json!({"id": "T1", "key": "ENG", "name": "Engineering"}).as_object().unwrap().clone()],
        );
        let loader = SnapshotLoader::new(
            Arc::new(CountingDb { calls: AtomicUsize::new(0), stores }),
            Arc::new(NoopDecoder),
            Option::<ScopeConfig>::None,
        );
        let cache = CachedSnapshot::with_ttl(loader, Duration::from_millis(20));
        cache.ensure_cache().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        {
            let guard = cache.inner.read().await;
            assert!(!CachedSnapshot::is_expired(&guard, cache.ttl), "fresh within TTL");
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        {
            let guard = cache.inner.read().await;
            assert!(CachedSnapshot::is_expired(&guard, cache.ttl), "expired past TTL");
        }
    }
}
