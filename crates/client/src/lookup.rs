//! Player lookup orchestration.
//!
//! Cache first; on a miss, one queued operation that fetches the profile
//! (with a single capitalization fallback for names), then shape, cache and
//! kick off avatar warming.
//!
//! Concurrent lookups for the same uncached key are not coalesced: each
//! one queues its own operation.

use std::sync::Arc;

use tierscope_core::TtlCache;

use crate::avatar::{ImageWarmer, spawn_warm};
use crate::profile::{ProfileLinks, ProfileResult};
use crate::queue::RequestQueue;
use crate::ranking::{RankingClient, RawProfile, Subject};
use crate::ApiError;

/// A resolved profile and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub profile: ProfileResult,
    pub from_cache: bool,
}

/// Cache key for a trimmed lookup input.
pub fn cache_key(input: &str) -> String {
    input.to_lowercase()
}

/// Resolves player names and ids to shaped profiles.
#[derive(Clone)]
pub struct PlayerLookup {
    client: RankingClient,
    queue: RequestQueue,
    cache: TtlCache<ProfileResult>,
    links: ProfileLinks,
    warmer: Option<Arc<dyn ImageWarmer>>,
}

impl PlayerLookup {
    pub fn new(client: RankingClient, queue: RequestQueue, cache: TtlCache<ProfileResult>, links: ProfileLinks) -> Self {
        Self { client, queue, cache, links, warmer: None }
    }

    /// Warm avatars after every successful network lookup.
    pub fn with_warmer(mut self, warmer: Arc<dyn ImageWarmer>) -> Self {
        self.warmer = Some(warmer);
        self
    }

    pub fn cache(&self) -> &TtlCache<ProfileResult> {
        &self.cache
    }

    pub fn links(&self) -> &ProfileLinks {
        &self.links
    }

    /// Resolve a raw name or id.
    pub async fn lookup(&self, raw: &str) -> Result<Lookup, ApiError> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(ApiError::InvalidInput("player name cannot be empty".into()));
        }

        let key = cache_key(input);
        if let Some(profile) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "lookup served from cache");
            return Ok(Lookup { profile, from_cache: true });
        }

        let client = self.client.clone();
        let subject = Subject::parse(input);
        let raw_profile = self
            .queue
            .enqueue(move || async move { fetch_with_fallback(&client, subject).await })
            .await??;

        let profile = ProfileResult::from_raw(raw_profile, &self.links);
        self.cache.set(&key, profile.clone());

        if let Some(warmer) = &self.warmer {
            spawn_warm(Arc::clone(warmer), profile.id.clone(), profile.avatar_url.clone());
        }

        tracing::debug!(key = %key, id = %profile.id, "lookup resolved from API");
        Ok(Lookup { profile, from_cache: false })
    }
}

async fn fetch_with_fallback(client: &RankingClient, subject: Subject) -> Result<RawProfile, ApiError> {
    match client.fetch_profile(&subject).await {
        Err(ApiError::NotFound) => match subject.capitalized() {
            Some(variant) => {
                tracing::debug!(original = %subject.as_str(), variant = %variant.as_str(), "retrying with capitalized name");
                client.fetch_profile(&variant).await
            }
            None => Err(ApiError::NotFound),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::ranking::{RankingConfig, RetryPolicy};
    use serde_json::json;
    use std::time::Duration;
    use tierscope_core::CacheDb;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOTCH_ID: &str = "069a79f444e94726a5befca90e38aaf5";

    fn notch_body() -> serde_json::Value {
        json!({
            "uuid": NOTCH_ID,
            "name": "Notch",
            "region": "EU",
            "points": 120,
            "rankings": { "sword": { "tier": 2, "pos": 0 }, "axe": { "tier": 3, "pos": 1 } },
            "tests": [ { "gamemode": "axe", "at": 10 }, { "gamemode": "sword", "at": 20 } ]
        })
    }

    async fn lookup_for(server: &MockServer) -> PlayerLookup {
        let client = RankingClient::new(RankingConfig {
            base_url: server.uri(),
            retry: RetryPolicy { base_delay: Duration::from_millis(1), max_jitter: Duration::ZERO, ..Default::default() },
            ..Default::default()
        })
        .unwrap();
        let cache = TtlCache::new(CacheDb::open_in_memory().await.unwrap());
        PlayerLookup::new(client, RequestQueue::with_interval(Duration::from_millis(5)), cache, ProfileLinks::default())
    }

    struct FailingWarmer;

    #[async_trait::async_trait]
    impl ImageWarmer for FailingWarmer {
        async fn warm(&self, _id: &str, _url: &str) -> Result<(), ApiError> {
            Err(ApiError::Server { status: 500 })
        }
    }

    struct RecordingWarmer(mpsc::UnboundedSender<(String, String)>);

    #[async_trait::async_trait]
    impl ImageWarmer for RecordingWarmer {
        async fn warm(&self, id: &str, url: &str) -> Result<(), ApiError> {
            let _ = self.0.send((id.to_string(), url.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fallback_capitalization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search_profile/notch"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search_profile/Notch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .expect(1)
            .mount(&server)
            .await;

        let result = lookup_for(&server).await.lookup("notch").await.unwrap();
        assert_eq!(result.profile.name, "Notch");
        assert!(!result.from_cache);
    }

    #[tokio::test]
    async fn test_exact_name_makes_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search_profile/Notch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .expect(1)
            .mount(&server)
            .await;

        let result = lookup_for(&server).await.lookup("Notch").await.unwrap();
        assert_eq!(result.profile.id, NOTCH_ID);
    }

    #[tokio::test]
    async fn test_identical_variant_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = lookup_for(&server).await.lookup("Ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_second_not_found_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let err = lookup_for(&server).await.lookup("ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_other_errors_skip_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = lookup_for(&server).await.lookup("notch").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search_profile/Notch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .expect(1)
            .mount(&server)
            .await;

        let lookup = lookup_for(&server).await;
        let first = lookup.lookup("Notch").await.unwrap();
        let second = lookup.lookup("  NOTCH ").await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.profile, second.profile);
    }

    #[tokio::test]
    async fn test_miss_populates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .mount(&server)
            .await;

        let lookup = lookup_for(&server).await;
        lookup.lookup(" Notch ").await.unwrap();

        let cached = lookup.cache().get("notch").await.unwrap();
        assert_eq!(cached.name, "Notch");
        let slugs: Vec<&str> = cached.gamemodes.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["axe", "sword"]);
        assert_eq!(cached.first_test.unwrap().at, 10);
    }

    #[tokio::test]
    async fn test_uuid_input_uses_profile_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/profile/{NOTCH_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .expect(1)
            .mount(&server)
            .await;

        let result = lookup_for(&server).await.lookup(NOTCH_ID).await.unwrap();
        assert_eq!(result.profile.name, "Notch");
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_requests() {
        let server = MockServer::start().await;
        let err = lookup_for(&server).await.lookup("   ").await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_misses_are_not_coalesced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .expect(2)
            .mount(&server)
            .await;

        let lookup = lookup_for(&server).await;
        let (a, b) = tokio::join!(lookup.lookup("Notch"), lookup.lookup("Notch"));
        assert!(!a.unwrap().from_cache);
        assert!(!b.unwrap().from_cache);
    }

    #[tokio::test]
    async fn test_warmer_failure_does_not_affect_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .mount(&server)
            .await;

        let lookup = lookup_for(&server).await.with_warmer(Arc::new(FailingWarmer));
        let result = lookup.lookup("Notch").await.unwrap();
        assert_eq!(result.profile.name, "Notch");
    }

    #[tokio::test]
    async fn test_successful_lookup_warms_avatar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notch_body()))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let lookup = lookup_for(&server).await.with_warmer(Arc::new(RecordingWarmer(tx)));
        let result = lookup.lookup("Notch").await.unwrap();

        let (id, url) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(id, NOTCH_ID);
        assert_eq!(url, result.profile.avatar_url);
    }
}
