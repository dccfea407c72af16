//! Ranking API response types.
//!
//! Mirrors the upstream profile document. Unknown fields are ignored and
//! optional fields default, so additive API changes don't break parsing.

use std::collections::HashMap;

use serde::Deserialize;

/// Raw profile document returned by both profile endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProfile {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub overall: Option<u32>,
    /// Rankings keyed by game mode slug.
    #[serde(default)]
    pub rankings: HashMap<String, RawRanking>,
    /// Historical test records, present when `tests=true` was requested.
    #[serde(default)]
    pub tests: Vec<RawTest>,
}

/// Ranking in a single game mode.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRanking {
    pub tier: u8,
    pub pos: u8,
    #[serde(default)]
    pub peak_tier: Option<u8>,
    #[serde(default)]
    pub peak_pos: Option<u8>,
    #[serde(default)]
    pub attained: Option<i64>,
    #[serde(default)]
    pub retired: bool,
}

/// A historical test record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTest {
    pub gamemode: String,
    /// Unix timestamp (seconds) of the test.
    pub at: i64,
    #[serde(default)]
    pub tier: Option<u8>,
    #[serde(default)]
    pub pos: Option<u8>,
    #[serde(default)]
    pub tester: Option<String>,
}
