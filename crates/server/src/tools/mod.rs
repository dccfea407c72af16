//! MCP tool implementations.
//!
//! This module contains all tools exposed by the tierscope server.

pub mod cache;
pub mod lookup_player;
pub mod prefetch_avatar;

pub use cache::{CachePurgeParams, purge_impl};
pub use lookup_player::{LookupPlayerParams, lookup_impl};
pub use prefetch_avatar::{PrefetchAvatarParams, prefetch_impl};
