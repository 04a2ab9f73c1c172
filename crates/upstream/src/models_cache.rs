//! In-memory, TTL-bounded cache of the upstream's model list.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const TTL: Duration = Duration::from_secs(300);

#[derive(Default)]
struct Entry {
    models: Vec<serde_json::Value>,
    fetched_at: Option<Instant>,
}

/// Caches `GET /models` for up to 300 seconds, keyed by nothing since this proxy is single-tenant.
pub(crate) struct ModelsCache {
    entry: Mutex<Entry>,
}

impl ModelsCache {
    pub(crate) fn new() -> Self {
        Self {
            entry: Mutex::new(Entry::default()),
        }
    }

    /// Returns a cached hit, or `None` if absent/expired — the caller must then fetch and
    /// call [`Self::store`].
    pub(crate) async fn get(&self) -> Option<Vec<serde_json::Value>> {
        let guard = self.entry.lock().await;
        let fetched_at = guard.fetched_at?;
        if fetched_at.elapsed() < TTL {
            Some(guard.models.clone())
        } else {
            None
        }
    }

    pub(crate) async fn store(&self, models: Vec<serde_json::Value>) {
        let mut guard = self.entry.lock().await;
        guard.models = models;
        guard.fetched_at = Some(Instant::now());
    }

    /// Drops any cached value, forcing the next `get` to miss. Called after a failed refresh.
    pub(crate) async fn invalidate(&self) {
        let mut guard = self.entry.lock().await;
        guard.fetched_at = None;
    }
}
