//! Core types and shared functionality for tierscope.
//!
//! This crate provides:
//! - Two-tier TTL cache (in-memory fast tier over a SQLite mirror)
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, TtlCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
