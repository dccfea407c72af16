//! Durable tier operations.
//!
//! One row per cache key holding the serialized value and its absolute
//! expiry in unix milliseconds. No other state is persisted.

use super::connection::CacheDb;
use crate::Error;
use chrono::Utc;
use tokio_rusqlite::params;

/// A row read back from the durable tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub value_json: String,
    pub expires_at: i64,
}

impl CacheDb {
    /// Get a stored entry by key, expired or not.
    ///
    /// Returns None if the key doesn't exist.
    pub async fn get_entry(&self, key: &str) -> Result<Option<StoredEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let mut stmt = conn.prepare("SELECT value_json, expires_at FROM lookup_cache WHERE key = ?1")?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(StoredEntry { value_json: row.get(0)?, expires_at: row.get(1)? })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the entry for a key.
    pub async fn put_entry(&self, key: &str, value_json: &str, expires_at: i64) -> Result<(), Error> {
        if key.is_empty() {
            return Err(Error::InvalidInput("cache key cannot be empty".into()));
        }

        let key = key.to_string();
        let value_json = value_json.to_string();
        let stored_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO lookup_cache (key, value_json, expires_at, stored_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        expires_at = excluded.expires_at,
                        stored_at = excluded.stored_at",
                    params![key, value_json, expires_at, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entry for a key.
    ///
    /// Returns whether a row was removed.
    pub async fn delete_entry(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM lookup_cache WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entry for a key only if it expired at or before `now_ms`.
    ///
    /// A row rewritten with a later expiry in the meantime is kept.
    pub async fn delete_expired_entry(&self, key: &str, now_ms: i64) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM lookup_cache WHERE key = ?1 AND expires_at <= ?2",
                    params![key, now_ms],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry whose expiry is at or before `now_ms`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_entries(&self, now_ms: i64) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM lookup_cache WHERE expires_at <= ?1", params![now_ms])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
