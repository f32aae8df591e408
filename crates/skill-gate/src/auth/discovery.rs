//! OpenID Connect discovery and signing key cache.
//!
//! The identity provider publishes a discovery document at
//! `{issuer}/.well-known/openid-configuration` whose `jwks_uri` lists the
//! keys it currently signs access tokens with. Keys rotate, so the cache is
//! refreshed on a timer and whenever a token names a key it does not hold.
//!
//! # Concurrency
//!
//! - Readers take the snapshot under a shared lock and never wait on a fetch
//!   unless the snapshot is missing or stale.
//! - Refreshes are serialized by a separate mutex. A caller that queued
//!   behind another refresh re-checks freshness first and reuses its result.
//! - `invalidate()` bumps an epoch instead of editing the snapshot, so an
//!   invalidation that races an in-flight refresh still forces the next
//!   `get()` to fetch again. `invalidate_if_fetched_before()` skips the bump
//!   when the cached set is already newer than the caller, so a burst of
//!   unknown `kid`s costs one refetch.
//!
//! # Failures
//!
//! Once a key set has been fetched it is never discarded. A failed refresh
//! serves the previous set and holds off further attempts for the failure
//! backoff, so a provider outage does not turn every request into a
//! timed-out fetch.

use crate::auth::http::{build_client, fetch_bytes};
use crate::observability::metrics::record_discovery_refresh;
use common::error::SkillGateError;
use jsonwebtoken::DecodingKey;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Token issuer the gate accepts (tenant STS).
pub const ISSUER: &str = "https://sts.windows.net/72f988bf-86f1-41af-91ab-2d7cd011db47/";

/// Path appended to the issuer to locate the discovery document.
pub const DISCOVERY_SUFFIX: &str = "/.well-known/openid-configuration";

/// Time to wait after a failed refresh before fetching again.
pub const DEFAULT_FAILED_REFRESH_BACKOFF: Duration = Duration::from_secs(30);

/// Largest discovery document or JWKS accepted (256 KiB).
pub const MAX_DISCOVERY_DOCUMENT_BYTES: usize = 256 * 1024;

/// Errors refreshing the discovery snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Invalid discovery URL: {0}")]
    InvalidUrl(String),

    #[error("Discovery fetch failed: {0}")]
    Fetch(String),

    #[error("Discovery fetch cancelled")]
    Cancelled,

    #[error("Invalid discovery document: {0}")]
    InvalidDocument(String),

    #[error("Signing key set contains no usable keys")]
    NoUsableKeys,
}

impl DiscoveryError {
    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DiscoveryError::Cancelled => "cancelled",
            DiscoveryError::InvalidUrl(_)
            | DiscoveryError::InvalidDocument(_)
            | DiscoveryError::NoUsableKeys => "invalid",
            DiscoveryError::Fetch(_) => "error",
        }
    }
}

impl From<SkillGateError> for DiscoveryError {
    fn from(err: SkillGateError) -> Self {
        match err {
            SkillGateError::Cancelled(_) => DiscoveryError::Cancelled,
            other => DiscoveryError::Fetch(other.to_string()),
        }
    }
}

/// Derive the discovery document URL from an issuer string.
pub fn discovery_url(issuer: &str) -> Result<Url, DiscoveryError> {
    let joined = format!("{}{DISCOVERY_SUFFIX}", issuer.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| DiscoveryError::InvalidUrl(format!("{joined}: {e}")))
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    issuer: Option<String>,
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

/// JSON Web Key as published by the identity provider.
#[derive(Debug, Deserialize)]
struct Jwk {
    kty: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Verification keys by key ID. Replaced wholesale on refresh.
#[derive(Clone, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, DecodingKey>,
}

impl SigningKeySet {
    /// Key for `kid`, if published.
    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Build from a JWKS, keeping RSA signing keys only.
    fn from_jwks(jwks: JwksDocument) -> Self {
        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.key_use.as_deref() == Some("enc") {
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                tracing::debug!(target: "gate.auth.discovery", "Skipping JWK without kid or components");
                continue;
            };
            match DecodingKey::from_rsa_components(&n, &e) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => {
                    tracing::warn!(target: "gate.auth.discovery", kid = %kid, error = %err, "Skipping unusable JWK");
                }
            }
        }
        Self { keys }
    }
}

impl fmt::Debug for SigningKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids: Vec<&String> = self.keys.keys().collect();
        kids.sort();
        f.debug_struct("SigningKeySet").field("kids", &kids).finish()
    }
}

struct Snapshot {
    keys: Arc<SigningKeySet>,
    fetched_at: Instant,
    epoch: u64,
}

/// Lazily populated, invalidatable cache of the provider's signing keys.
pub struct DiscoveryCache {
    issuer: String,
    discovery_url: Url,
    http_client: reqwest::Client,
    refresh_interval: Duration,
    failed_refresh_backoff: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    /// Serializes refreshes; holds the time of the last failed one.
    refresh_lock: Mutex<Option<Instant>>,
    epoch: AtomicU64,
}

impl DiscoveryCache {
    /// Cache for the gate's fixed issuer.
    pub fn new(timeout: Duration, refresh_interval: Duration) -> Result<Self, DiscoveryError> {
        Self::with_issuer(ISSUER, timeout, refresh_interval)
    }

    /// Cache for an explicit issuer.
    pub fn with_issuer(
        issuer: &str,
        timeout: Duration,
        refresh_interval: Duration,
    ) -> Result<Self, DiscoveryError> {
        Ok(Self {
            issuer: issuer.to_string(),
            discovery_url: discovery_url(issuer)?,
            http_client: build_client(timeout)?,
            refresh_interval,
            failed_refresh_backoff: DEFAULT_FAILED_REFRESH_BACKOFF,
            snapshot: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            epoch: AtomicU64::new(0),
        })
    }

    /// Override how long a failed refresh suppresses further attempts.
    pub fn with_failed_refresh_backoff(mut self, backoff: Duration) -> Self {
        self.failed_refresh_backoff = backoff;
        self
    }

    /// Issuer this cache serves keys for.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Current signing keys, fetching them if missing or stale.
    ///
    /// Fails only while no key set has ever been fetched. After that, a
    /// failed refresh returns the previous set.
    #[instrument(skip_all)]
    pub async fn get(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<SigningKeySet>, DiscoveryError> {
        if let Some(keys) = self.fresh_keys().await {
            return Ok(keys);
        }

        let mut last_failure = self.refresh_lock.lock().await;

        // Another caller may have refreshed while this one waited
        if let Some(keys) = self.fresh_keys().await {
            tracing::debug!(target: "gate.auth.discovery", "Reusing concurrent refresh");
            return Ok(keys);
        }

        if (*last_failure).is_some_and(|at| at.elapsed() < self.failed_refresh_backoff) {
            if let Some(keys) = self.previous_keys().await {
                tracing::debug!(
                    target: "gate.auth.discovery",
                    "Refresh backing off, serving previous signing keys"
                );
                return Ok(keys);
            }
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let start = Instant::now();
        match self.fetch(cancel).await {
            Ok(keys) => {
                let keys = Arc::new(keys);
                tracing::info!(
                    target: "gate.auth.discovery",
                    keys = keys.len(),
                    "Signing keys refreshed"
                );
                record_discovery_refresh("success", start.elapsed());
                *last_failure = None;
                *self.snapshot.write().await = Some(Snapshot {
                    keys: Arc::clone(&keys),
                    fetched_at: Instant::now(),
                    epoch,
                });
                Ok(keys)
            }
            Err(DiscoveryError::Cancelled) => {
                record_discovery_refresh(DiscoveryError::Cancelled.as_label(), start.elapsed());
                tracing::debug!(target: "gate.auth.discovery", "Signing key refresh cancelled");
                Err(DiscoveryError::Cancelled)
            }
            Err(e) => {
                record_discovery_refresh(e.as_label(), start.elapsed());
                *last_failure = Some(Instant::now());
                match self.previous_keys().await {
                    Some(keys) => {
                        tracing::warn!(
                            target: "gate.auth.discovery",
                            error = %e,
                            "Signing key refresh failed, serving previous signing keys"
                        );
                        Ok(keys)
                    }
                    None => {
                        tracing::error!(target: "gate.auth.discovery", error = %e, "Signing key refresh failed");
                        Err(e)
                    }
                }
            }
        }
    }

    /// Mark the snapshot stale so the next `get()` fetches again.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target: "gate.auth.discovery", "Signing keys invalidated");
    }

    /// Invalidate only if the cached key set was fetched before `since` and
    /// is not already invalidated. Returns whether this call invalidated it.
    ///
    /// A caller that started before the current set was fetched already sees
    /// keys newer than its own request, so it does not force another fetch.
    pub async fn invalidate_if_fetched_before(&self, since: Instant) -> bool {
        // Held across the bump so no refresh can store a snapshot in between
        let snapshot = self.snapshot.read().await;
        let older = snapshot.as_ref().is_some_and(|s| {
            s.fetched_at < since && s.epoch == self.epoch.load(Ordering::SeqCst)
        });
        if older {
            self.invalidate();
        }
        older
    }

    async fn fresh_keys(&self) -> Option<Arc<SigningKeySet>> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|s| {
                s.epoch == self.epoch.load(Ordering::SeqCst)
                    && s.fetched_at.elapsed() < self.refresh_interval
            })
            .map(|s| Arc::clone(&s.keys))
    }

    /// Last fetched key set, fresh or not.
    async fn previous_keys(&self) -> Option<Arc<SigningKeySet>> {
        let snapshot = self.snapshot.read().await;
        snapshot.as_ref().map(|s| Arc::clone(&s.keys))
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<SigningKeySet, DiscoveryError> {
        let body = fetch_bytes(
            &self.http_client,
            &self.discovery_url,
            MAX_DISCOVERY_DOCUMENT_BYTES,
            cancel,
        )
        .await?;
        let document: DiscoveryDocument = serde_json::from_slice(&body)
            .map_err(|e| DiscoveryError::InvalidDocument(e.to_string()))?;

        if let Some(published) = document.issuer.as_deref() {
            if published.trim_end_matches('/') != self.issuer.trim_end_matches('/') {
                tracing::warn!(
                    target: "gate.auth.discovery",
                    published = %published,
                    "Discovery document issuer differs from configured issuer"
                );
            }
        }

        let jwks_uri = checked_jwks_uri(&self.discovery_url, &document.jwks_uri)?;

        let body = fetch_bytes(
            &self.http_client,
            &jwks_uri,
            MAX_DISCOVERY_DOCUMENT_BYTES,
            cancel,
        )
        .await?;
        let jwks: JwksDocument = serde_json::from_slice(&body)
            .map_err(|e| DiscoveryError::InvalidDocument(e.to_string()))?;

        let keys = SigningKeySet::from_jwks(jwks);
        if keys.is_empty() {
            return Err(DiscoveryError::NoUsableKeys);
        }
        Ok(keys)
    }
}

/// Parse `jwks_uri`, refusing a downgrade from an https discovery endpoint.
fn checked_jwks_uri(discovery_url: &Url, jwks_uri: &str) -> Result<Url, DiscoveryError> {
    let url = Url::parse(jwks_uri)
        .map_err(|e| DiscoveryError::InvalidDocument(format!("jwks_uri: {e}")))?;
    if discovery_url.scheme() == "https" && url.scheme() != "https" {
        return Err(DiscoveryError::InvalidDocument(
            "jwks_uri must use https".to_string(),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use skill_test_utils::{
        jwks_document, MockIdentityProvider, PublishedKey, IDP_KEY_A_PEM, IDP_KEY_B_PEM,
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY_A: PublishedKey = PublishedKey {
        kid: "key-a",
        pem: IDP_KEY_A_PEM,
    };
    const KEY_B: PublishedKey = PublishedKey {
        kid: "key-b",
        pem: IDP_KEY_B_PEM,
    };

    fn cache_for(issuer: &str) -> DiscoveryCache {
        DiscoveryCache::with_issuer(issuer, Duration::from_secs(5), Duration::from_secs(3600))
            .unwrap()
    }

    /// Server publishing a discovery document and an arbitrary JWKS body.
    async fn server_with_jwks(jwks: serde_json::Value) -> (MockServer, String) {
        server_with_jwks_response(ResponseTemplate::new(200).set_body_json(jwks)).await
    }

    async fn server_with_jwks_response(jwks: ResponseTemplate) -> (MockServer, String) {
        let server = MockServer::start().await;
        let issuer = format!("{}/custom/", server.uri());
        Mock::given(method("GET"))
            .and(path("/custom/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": issuer,
                "jwks_uri": format!("{}/custom/keys", server.uri()),
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/custom/keys"))
            .respond_with(jwks)
            .mount(&server)
            .await;
        (server, issuer)
    }

    // =========================================================================
    // URL derivation
    // =========================================================================

    #[test]
    fn test_discovery_url_for_fixed_issuer() {
        assert_eq!(
            discovery_url(ISSUER).unwrap().as_str(),
            "https://sts.windows.net/72f988bf-86f1-41af-91ab-2d7cd011db47/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_without_trailing_slash() {
        assert_eq!(
            discovery_url("https://issuer.test/tenant").unwrap().as_str(),
            "https://issuer.test/tenant/.well-known/openid-configuration"
        );
        assert!(matches!(
            discovery_url("not a url"),
            Err(DiscoveryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_jwks_uri_downgrade_is_refused() {
        let https = discovery_url(ISSUER).unwrap();
        assert!(checked_jwks_uri(&https, "https://login.example/keys").is_ok());
        assert!(matches!(
            checked_jwks_uri(&https, "http://login.example/keys"),
            Err(DiscoveryError::InvalidDocument(_))
        ));

        let http = discovery_url("http://127.0.0.1:8080/tenant/").unwrap();
        assert!(checked_jwks_uri(&http, "http://127.0.0.1:8080/keys").is_ok());
    }

    // =========================================================================
    // Caching
    // =========================================================================

    #[tokio::test]
    async fn test_get_populates_then_serves_cached() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer());

        let first = cache.get(&CancellationToken::new()).await.unwrap();
        let second = cache.get(&CancellationToken::new()).await.unwrap();

        assert!(first.contains("key-a"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(idp.discovery_fetch_count().await, 1);
        assert_eq!(idp.jwks_fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_and_replaces_set() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer());

        let before = cache.get(&CancellationToken::new()).await.unwrap();
        assert!(!before.contains("key-b"));

        idp.publish(&[KEY_B]).await.unwrap();
        cache.invalidate();
        let after = cache.get(&CancellationToken::new()).await.unwrap();

        assert!(after.contains("key-b"));
        assert!(!after.contains("key-a"));
        assert_eq!(idp.jwks_fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_elapsed_refresh_interval_refetches() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache =
            DiscoveryCache::with_issuer(&idp.issuer(), Duration::from_secs(5), Duration::ZERO)
                .unwrap();

        cache.get(&CancellationToken::new()).await.unwrap();
        cache.get(&CancellationToken::new()).await.unwrap();

        assert_eq!(idp.jwks_fetch_count().await, 2);
    }

    #[tokio::test]
    async fn test_conditional_invalidate_skips_newer_or_pending_sets() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer());
        let first = cache.get(&CancellationToken::new()).await.unwrap();
        let started = Instant::now();

        assert!(cache.invalidate_if_fetched_before(started).await);
        // Already invalidated, waiting for the next get()
        assert!(!cache.invalidate_if_fetched_before(started).await);

        let second = cache.get(&CancellationToken::new()).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        // The set was fetched after `started`, so no further fetch is forced
        assert!(!cache.invalidate_if_fetched_before(started).await);
        let third = cache.get(&CancellationToken::new()).await.unwrap();
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(idp.jwks_fetch_count().await, 2);
    }

    #[tokio::test]
    async fn test_invalidate_during_refresh_forces_next_fetch() {
        let jwks = jwks_document(&[KEY_A]).unwrap();
        let (server, issuer) = server_with_jwks_response(
            ResponseTemplate::new(200)
                .set_body_json(jwks)
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        let cache = Arc::new(cache_for(&issuer));

        let in_flight = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get(&CancellationToken::new()).await })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        cache.invalidate();

        assert!(in_flight.await.unwrap().is_ok());
        cache.get(&CancellationToken::new()).await.unwrap();

        let jwks_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/custom/keys")
            .count();
        assert_eq!(jwks_requests, 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = Arc::new(cache_for(&idp.issuer()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get(&CancellationToken::new()).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(idp.jwks_fetch_count().await, 1);
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[tokio::test]
    async fn test_provider_outage_is_an_error() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        idp.go_down().await;
        let cache = cache_for(&idp.issuer());

        let result = cache.get(&CancellationToken::new()).await;
        assert!(matches!(result, Err(DiscoveryError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_previous_keys() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer());
        let before = cache.get(&CancellationToken::new()).await.unwrap();

        idp.go_down().await;
        cache.invalidate();
        let during = cache.get(&CancellationToken::new()).await.unwrap();

        assert!(Arc::ptr_eq(&before, &during));
        assert!(during.contains("key-a"));
        assert_eq!(idp.discovery_fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_backs_off() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer());
        cache.get(&CancellationToken::new()).await.unwrap();

        idp.go_down().await;
        cache.invalidate();
        cache.get(&CancellationToken::new()).await.unwrap();
        cache.invalidate();
        let keys = cache.get(&CancellationToken::new()).await.unwrap();

        assert!(keys.contains("key-a"));
        assert_eq!(idp.discovery_fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_then_recovery() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer()).with_failed_refresh_backoff(Duration::ZERO);
        cache.get(&CancellationToken::new()).await.unwrap();

        idp.go_down().await;
        cache.invalidate();
        assert_eq!(cache.get(&CancellationToken::new()).await.unwrap().len(), 1);

        idp.publish(&[KEY_A, KEY_B]).await.unwrap();
        let keys = cache.get(&CancellationToken::new()).await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_refresh() {
        let idp = MockIdentityProvider::start(&[KEY_A]).await.unwrap();
        let cache = cache_for(&idp.issuer());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(cache.get(&cancel).await.unwrap_err(), DiscoveryError::Cancelled);
    }

    #[tokio::test]
    async fn test_encryption_and_non_rsa_keys_are_skipped() {
        let mut jwks = jwks_document(&[KEY_A]).unwrap();
        jwks["keys"][0]["use"] = json!("enc");
        jwks["keys"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "kty": "EC", "kid": "ec-key", "crv": "P-256", "x": "AA", "y": "AA" }));
        let (_server, issuer) = server_with_jwks(jwks).await;
        let cache = cache_for(&issuer);

        assert_eq!(
            cache.get(&CancellationToken::new()).await.unwrap_err(),
            DiscoveryError::NoUsableKeys
        );
    }

    #[tokio::test]
    async fn test_keys_without_kid_are_skipped() {
        let mut jwks = jwks_document(&[KEY_A, KEY_B]).unwrap();
        jwks["keys"][1].as_object_mut().unwrap().remove("kid");
        let (_server, issuer) = server_with_jwks(jwks).await;
        let cache = cache_for(&issuer);

        let keys = cache.get(&CancellationToken::new()).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.get("key-a").is_some());
    }

    #[tokio::test]
    async fn test_malformed_jwks_is_invalid_document() {
        let (_server, issuer) = server_with_jwks(json!({ "not_keys": [] })).await;
        let cache = cache_for(&issuer);

        assert!(matches!(
            cache.get(&CancellationToken::new()).await,
            Err(DiscoveryError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_key_set_debug_lists_kids_only() {
        let set = SigningKeySet::default();
        assert_eq!(format!("{set:?}"), "SigningKeySet { kids: [] }");
    }
}
