//! Two-tier cache for shaped lookup results.
//!
//! The fast tier is an in-process `DashMap`; the durable tier is a SQLite
//! table accessed via tokio-rusqlite. It supports:
//!
//! - Absolute expiry timestamps stored alongside each value
//! - Lazy expiry (expired entries are dropped when next read)
//! - Warm-on-read promotion from the durable tier after a cold start
//! - Fire-and-forget durable writes
//! - Automatic schema migrations

pub mod connection;
pub mod migrations;
pub mod store;
pub mod ttl;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::StoredEntry;
pub use ttl::{CacheEntry, DEFAULT_TTL, TtlCache};
