//! Client code for tierscope.
//!
//! This crate provides the ranking API client with retry/backoff, the
//! rate-limited request queue, profile shaping, avatar warming and the
//! lookup orchestrator that ties them to the core cache.

pub mod avatar;
pub mod error;
pub mod lookup;
pub mod profile;
pub mod queue;
pub mod ranking;

pub use avatar::{HttpImageWarmer, ImageWarmer, spawn_warm};
pub use error::{ApiError, ErrorKind, QueueError};
pub use lookup::{Lookup, PlayerLookup, cache_key};
pub use profile::{GamemodeRanking, ProfileLinks, ProfileResult, TestRecord};
pub use queue::{MIN_REQUEST_INTERVAL, RequestQueue};
pub use ranking::{RankingClient, RankingConfig, RetryPolicy, Subject};
