//! Two-tier TTL cache: `DashMap` fast tier over the SQLite durable tier.
//!
//! ## Lookup Order
//!
//! 1. Fast tier. An unexpired entry is returned as is.
//! 2. Durable tier. An unexpired row is decoded and promoted ("warmed") into
//!    the fast tier before it is returned.
//! 3. Otherwise the key is absent.
//!
//! Expired entries found in either tier are removed on that read; there is no
//! background sweep. After a cold start the fast tier is empty while the
//! durable tier still holds rows, which the warm step resolves.
//!
//! Durable-tier failures never surface through `get`/`set`; they are logged
//! and the cache behaves as if the durable tier had missed.
//!
//! A `set` racing a `get` on the same key always wins: promotion never
//! replaces a valid fast entry, and a durable write only lands if its entry
//! is still the current one.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::connection::CacheDb;
use crate::Error;

/// TTL applied to every write.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60);

/// A cached value and its absolute expiry (unix milliseconds).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: i64,
}

impl<V> CacheEntry<V> {
    /// Create an entry that expires `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self { value, expires_at: now_millis().saturating_add(ttl_ms) }
    }

    /// An entry is valid iff `now < expires_at`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Two-tier key/value cache with a fixed TTL per write.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    fast: Arc<DashMap<String, CacheEntry<V>>>,
    durable: CacheDb,
    ttl: Duration,
    /// Held by every durable write and by `invalidate`.
    write_gate: Arc<Mutex<()>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a cache over `durable` using [`DEFAULT_TTL`].
    pub fn new(durable: CacheDb) -> Self {
        Self::with_ttl(durable, DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL window.
    pub fn with_ttl(durable: CacheDb, ttl: Duration) -> Self {
        Self { fast: Arc::new(DashMap::new()), durable, ttl, write_gate: Arc::new(Mutex::new(())) }
    }

    /// Look a key up in the fast tier, then the durable tier.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = now_millis();
        let fast_hit = self
            .fast
            .get(key)
            .map(|entry| entry.is_valid_at(now).then(|| entry.value.clone()));

        match fast_hit {
            Some(Some(value)) => {
                tracing::debug!(key = %key, tier = "fast", "cache hit");
                return Some(value);
            }
            Some(None) => {
                self.fast.remove_if(key, |_, entry| !entry.is_valid_at(now));
            }
            None => {}
        }

        let stored = match self.durable.get_entry(key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                return self.fresh_fast_value(key);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "durable cache read failed");
                return self.fresh_fast_value(key);
            }
        };

        let now = now_millis();
        if stored.expires_at <= now {
            tracing::debug!(key = %key, "durable cache entry expired");
            if let Err(e) = self.durable.delete_expired_entry(key, now).await {
                tracing::warn!(key = %key, error = %e, "failed to purge expired cache entry");
            }
            return self.fresh_fast_value(key);
        }

        let value: V = match serde_json::from_str(&stored.value_json) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "undecodable durable cache entry");
                return self.fresh_fast_value(key);
            }
        };

        Some(self.promote(key, CacheEntry { value, expires_at: stored.expires_at }))
    }

    /// Warm the fast tier with a durable hit.
    ///
    /// A valid fast entry written while the durable read was in flight wins
    /// over the durable copy; the value actually held is returned.
    fn promote(&self, key: &str, warmed: CacheEntry<V>) -> V {
        match self.fast.entry(key.to_string()) {
            Entry::Occupied(current) if current.get().is_valid_at(now_millis()) => {
                tracing::debug!(key = %key, "fast tier written during durable read, keeping it");
                current.get().value.clone()
            }
            Entry::Occupied(mut current) => {
                tracing::debug!(key = %key, tier = "durable", "cache hit, warming fast tier");
                let value = warmed.value.clone();
                current.insert(warmed);
                value
            }
            Entry::Vacant(slot) => {
                tracing::debug!(key = %key, tier = "durable", "cache hit, warming fast tier");
                let value = warmed.value.clone();
                slot.insert(warmed);
                value
            }
        }
    }

    /// A `set` may land while the durable tier is being probed.
    fn fresh_fast_value(&self, key: &str) -> Option<V> {
        let now = now_millis();
        self.fast
            .get(key)
            .and_then(|entry| entry.is_valid_at(now).then(|| entry.value.clone()))
    }

    /// Write a value to both tiers.
    ///
    /// The fast tier is updated before this returns. The durable write runs
    /// on a detached task; the returned handle may be awaited but callers
    /// normally drop it. The write is skipped if, by the time it runs, the
    /// key was invalidated or overwritten by a later `set`.
    pub fn set(&self, key: &str, value: V) -> JoinHandle<()> {
        let entry = CacheEntry::new(value, self.ttl);
        let expires_at = entry.expires_at;
        let durable_value = entry.value.clone();
        self.fast.insert(key.to_string(), entry);

        let fast = Arc::clone(&self.fast);
        let durable = self.durable.clone();
        let gate = Arc::clone(&self.write_gate);
        let key = key.to_string();
        tokio::spawn(async move {
            let _guard = gate.lock().await;
            let current = fast.get(&key).map(|entry| entry.expires_at);
            if current != Some(expires_at) {
                tracing::debug!(key = %key, "durable cache write superseded, skipping");
                return;
            }

            let result = match serde_json::to_string(&durable_value) {
                Ok(json) => durable.put_entry(&key, &json, expires_at).await,
                Err(e) => Err(Error::from(e)),
            };

            match result {
                Ok(()) => tracing::debug!(key = %key, expires_at, "cache set (fast+durable)"),
                Err(e) => tracing::warn!(key = %key, error = %e, "durable cache write failed"),
            }
        })
    }

    /// Remove a key from both tiers.
    ///
    /// Durable writes still pending for the key are either finished before
    /// the row is deleted or skipped.
    pub async fn invalidate(&self, key: &str) -> Result<(), Error> {
        self.fast.remove(key);
        let _guard = self.write_gate.lock().await;
        self.durable.delete_entry(key).await?;
        Ok(())
    }

    /// Drop expired entries from both tiers.
    ///
    /// Returns the number of durable rows deleted.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = now_millis();
        self.fast.retain(|_, entry| entry.is_valid_at(now));
        self.durable.purge_expired_entries(now).await
    }
}
