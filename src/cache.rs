// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs as async_fs;
use tracing::{debug, warn};

/// Freshness window for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// Milliseconds since the Unix epoch.
    pub stored_at: i64,
    pub value: Value,
}

impl CacheEntry {
    pub fn new(key: &str, value: Value, stored_at: i64) -> Self {
        Self {
            key: key.to_string(),
            stored_at,
            value,
        }
    }

    pub fn is_stale(&self, now: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.saturating_sub(self.stored_at) > ttl_ms
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
}

/// Key/value store of JSON responses, one file per key.
///
/// Reads expire lazily: a stale entry is deleted by the read that finds it.
/// Nothing else ever evicts.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ResponseCache {
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join("moviecat")
            .join("responses");
        Self::with_dir(cache_dir)
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let cache = Self {
            cache_dir: dir.as_ref().to_path_buf(),
        };
        cache.ensure_cache_dir_exists()?;
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn ensure_cache_dir_exists(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir).with_context(|| {
                format!(
                    "Failed to create cache directory: {}",
                    self.cache_dir.display()
                )
            })?;
        }
        Ok(())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.cache_dir.join(format!("{}.json", &digest[..32]))
    }

    pub async fn get(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.get_at(key, ttl, now_millis()).await
    }

    pub async fn get_at(&self, key: &str, ttl: Duration, now: i64) -> Option<Value> {
        let path = self.entry_path(key);
        let content = async_fs::read_to_string(&path).await.ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        if entry.key != key {
            return None;
        }

        if entry.is_stale(now, ttl) {
            debug!("Cache entry expired: {}", key);
            let _ = async_fs::remove_file(&path).await;
            return None;
        }

        Some(entry.value)
    }

    pub async fn set(&self, key: &str, value: &Value) {
        self.set_at(key, value, now_millis()).await
    }

    /// Best effort. A failed write is logged and otherwise ignored.
    pub async fn set_at(&self, key: &str, value: &Value, now: i64) {
        if let Err(e) = self.try_store(key, value, now).await {
            warn!("Failed to cache response for {}: {}", key, e);
        }
    }

    async fn try_store(&self, key: &str, value: &Value, now: i64) -> Result<()> {
        let path = self.entry_path(key);
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            async_fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let entry = CacheEntry::new(key, value.clone(), now);
        let content =
            serde_json::to_string(&entry).with_context(|| "Failed to serialize cache entry")?;

        async_fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
        Ok(())
    }

    pub async fn contains(&self, key: &str) -> bool {
        async_fs::try_exists(self.entry_path(key))
            .await
            .unwrap_or(false)
    }

    pub async fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            async_fs::remove_dir_all(&self.cache_dir)
                .await
                .with_context(|| {
                    format!(
                        "Failed to remove cache directory: {}",
                        self.cache_dir.display()
                    )
                })?;
        }
        self.ensure_cache_dir_exists()
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        if !self.cache_dir.exists() {
            return Ok(stats);
        }

        let entries = fs::read_dir(&self.cache_dir).with_context(|| {
            format!("Failed to read cache directory: {}", self.cache_dir.display())
        })?;
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata()
                && meta.is_file()
            {
                stats.entries += 1;
                stats.bytes += meta.len();
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T: i64 = 1_700_000_000_000;

    fn cache() -> (tempfile::TempDir, ResponseCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::with_dir(dir.path().join("responses")).unwrap();
        (dir, cache)
    }

    #[tokio::test]
    async fn value_is_fresh_until_ttl_elapses() {
        let (_dir, cache) = cache();
        let ttl = Duration::from_secs(300);
        cache.set_at("k", &json!({"a": 1}), T).await;

        assert_eq!(cache.get_at("k", ttl, T).await, Some(json!({"a": 1})));
        assert_eq!(
            cache.get_at("k", ttl, T + 300_000).await,
            Some(json!({"a": 1}))
        );
    }

    #[tokio::test]
    async fn stale_read_returns_none_and_removes_entry() {
        let (_dir, cache) = cache();
        let ttl = Duration::from_secs(300);
        cache.set_at("k", &json!([1, 2]), T).await;

        assert_eq!(cache.get_at("k", ttl, T + 300_001).await, None);
        assert!(!cache.contains("k").await);
        // Even a read "in the past" finds nothing once the record is gone.
        assert_eq!(cache.get_at("k", ttl, T).await, None);

        cache.set_at("k", &json!("again"), T + 400_000).await;
        assert_eq!(
            cache.get_at("k", ttl, T + 400_001).await,
            Some(json!("again"))
        );
    }

    #[tokio::test]
    async fn corrupted_entry_is_a_miss() {
        let (_dir, cache) = cache();
        std::fs::write(cache.entry_path("bad"), "{not json").unwrap();
        assert_eq!(cache.get("bad", DEFAULT_TTL).await, None);
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_timestamp() {
        let (_dir, cache) = cache();
        let ttl = Duration::from_secs(10);
        cache.set_at("k", &json!(1), T).await;
        cache.set_at("k", &json!(2), T + 9_000).await;
        assert_eq!(cache.get_at("k", ttl, T + 15_000).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn set_into_unwritable_location_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // The cache directory path runs through a regular file.
        let cache = ResponseCache {
            cache_dir: blocker.join("responses"),
        };
        cache.set("k", &json!(1)).await;
        assert_eq!(cache.get("k", DEFAULT_TTL).await, None);
    }

    #[tokio::test]
    async fn clear_and_stats() {
        let (_dir, cache) = cache();
        cache.set("a", &json!(1)).await;
        cache.set("b", &json!(2)).await;
        assert_eq!(cache.stats().unwrap().entries, 2);

        cache.clear().await.unwrap();
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
        assert_eq!(cache.get("a", DEFAULT_TTL).await, None);
    }
}
