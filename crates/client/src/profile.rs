//! Shaped profile returned to callers and stored in the cache.

use serde::{Deserialize, Serialize};

use crate::ranking::{RawProfile, RawRanking, RawTest};

/// A player's ranking in one game mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamemodeRanking {
    pub slug: String,
    pub tier: u8,
    pub pos: u8,
    pub peak_tier: Option<u8>,
    pub peak_pos: Option<u8>,
    pub attained: Option<i64>,
    pub retired: bool,
}

/// One historical test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub gamemode: String,
    pub at: i64,
    pub tier: Option<u8>,
    pub pos: Option<u8>,
    pub tester: Option<String>,
}

/// Profile as handed to the UI.
///
/// `gamemodes` is sorted by slug, `tests` newest first, and `first_test` is
/// the oldest test (the last element of `tests`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResult {
    pub id: String,
    pub name: String,
    pub region: Option<String>,
    pub score: u32,
    pub overall: Option<u32>,
    pub gamemodes: Vec<GamemodeRanking>,
    pub tests: Vec<TestRecord>,
    pub first_test: Option<TestRecord>,
    pub avatar_url: String,
    pub profile_url: String,
}

/// URL templates for derived profile links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLinks {
    avatar_template: String,
    profile_template: String,
}

impl ProfileLinks {
    /// `avatar_template` must contain `{id}`, `profile_template` `{name}`.
    pub fn new(avatar_template: impl Into<String>, profile_template: impl Into<String>) -> Self {
        Self { avatar_template: avatar_template.into(), profile_template: profile_template.into() }
    }

    pub fn avatar_url(&self, id: &str) -> String {
        self.avatar_template.replace("{id}", &escape(id))
    }

    pub fn profile_url(&self, name: &str) -> String {
        self.profile_template.replace("{name}", &escape(name))
    }
}

impl Default for ProfileLinks {
    fn default() -> Self {
        Self::new("https://render.crafty.gg/3d/bust/{id}", "https://mctiers.com/player/{name}")
    }
}

fn escape(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl ProfileResult {
    /// Reshape an upstream profile.
    pub fn from_raw(raw: RawProfile, links: &ProfileLinks) -> Self {
        let mut gamemodes: Vec<GamemodeRanking> = raw
            .rankings
            .into_iter()
            .map(|(slug, ranking)| GamemodeRanking::from_raw(slug, ranking))
            .collect();
        gamemodes.sort_by(|a, b| a.slug.cmp(&b.slug));

        let mut tests: Vec<TestRecord> = raw.tests.into_iter().map(TestRecord::from).collect();
        tests.sort_by(|a, b| b.at.cmp(&a.at));
        let first_test = tests.last().cloned();

        Self {
            avatar_url: links.avatar_url(&raw.uuid),
            profile_url: links.profile_url(&raw.name),
            id: raw.uuid,
            name: raw.name,
            region: raw.region,
            score: raw.points,
            overall: raw.overall,
            gamemodes,
            tests,
            first_test,
        }
    }
}

impl GamemodeRanking {
    fn from_raw(slug: String, raw: RawRanking) -> Self {
        Self {
            slug,
            tier: raw.tier,
            pos: raw.pos,
            peak_tier: raw.peak_tier,
            peak_pos: raw.peak_pos,
            attained: raw.attained,
            retired: raw.retired,
        }
    }
}

impl From<RawTest> for TestRecord {
    fn from(raw: RawTest) -> Self {
        Self { gamemode: raw.gamemode, at: raw.at, tier: raw.tier, pos: raw.pos, tester: raw.tester }
    }
}
