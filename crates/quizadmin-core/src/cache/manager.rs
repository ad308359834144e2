use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Freshness window used when the requested one cannot be represented
pub const DEFAULT_STALE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self, stale_after: Duration) -> bool {
        Utc::now() - self.cached_at > stale_after
    }
}

/// Server-state cache keyed by request path (query string included).
///
/// Entries are JSON payloads exactly as the server returned them. Nothing is
/// written to disk. Clones share the same map.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, CachedData<Value>>>>,
    stale_after: Duration,
}

impl QueryCache {
    /// Negative or out-of-range windows fall back to `DEFAULT_STALE_MINUTES`.
    pub fn new(stale_minutes: i64) -> Self {
        let stale_after = Duration::try_minutes(stale_minutes)
            .filter(|window| *window >= Duration::zero())
            .unwrap_or_else(|| {
                warn!(stale_minutes, "Unusable cache freshness window, using default");
                Duration::minutes(DEFAULT_STALE_MINUTES)
            });
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            stale_after,
        }
    }

    /// Fresh entry for `key`, decoded into `T`. Stale or undecodable entries miss.
    pub async fn get_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let cached = entries.get(key)?;
        if cached.is_stale(self.stale_after) {
            debug!(key = key, age = %cached.age_display(), "Cache entry stale");
            return None;
        }
        serde_json::from_value(cached.data.clone()).ok()
    }

    pub async fn entry(&self, key: &str) -> Option<CachedData<Value>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn put(&self, key: &str, data: Value) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), CachedData::new(data));
    }

    /// Drop every entry whose key is `prefix` or lives below it.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key_under(key, prefix));
        let removed = before - entries.len();
        debug!(prefix = prefix, removed, "Cache invalidated");
        removed
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        debug!(entries = entries.len(), "Cache cleared");
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Age of the newest entry, for status display.
    pub async fn last_updated(&self) -> String {
        self.entries
            .read()
            .await
            .values()
            .max_by_key(|c| c.cached_at)
            .map(|c| c.age_display())
            .unwrap_or_else(|| "never".to_string())
    }
}

fn key_under(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
