//! Mock OpenID Connect identity provider
//!
//! Serves a discovery document and a JWKS from a `wiremock` server. The
//! published key set can be swapped at runtime to simulate key rotation, and
//! fetch counts are observable so tests can assert how often the gate
//! refreshed.

use crate::crypto_fixtures::{rsa_jwk_components, FixtureError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT_PATH: &str = "/tenant";
const DISCOVERY_PATH: &str = "/tenant/.well-known/openid-configuration";
const JWKS_PATH: &str = "/tenant/discovery/keys";

/// A published signing key: key ID plus the private key PEM it derives from.
#[derive(Debug, Clone, Copy)]
pub struct PublishedKey {
    pub kid: &'static str,
    pub pem: &'static str,
}

/// Mock identity provider backed by a `wiremock` server.
pub struct MockIdentityProvider {
    server: MockServer,
}

impl MockIdentityProvider {
    /// Start a provider publishing `keys`.
    pub async fn start(keys: &[PublishedKey]) -> Result<Self, FixtureError> {
        let server = MockServer::start().await;
        let idp = Self { server };
        idp.publish(keys).await?;
        Ok(idp)
    }

    /// Issuer string, with the trailing slash the real provider uses.
    pub fn issuer(&self) -> String {
        format!("{}{}/", self.server.uri(), TENANT_PATH)
    }

    /// Replace the published key set (simulates key rotation).
    pub async fn publish(&self, keys: &[PublishedKey]) -> Result<(), FixtureError> {
        let jwks = jwks_document(keys)?;
        self.server.reset().await;

        Mock::given(method("GET"))
            .and(path(DISCOVERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": self.issuer(),
                "jwks_uri": format!("{}{}", self.server.uri(), JWKS_PATH),
                "id_token_signing_alg_values_supported": ["RS256"],
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&self.server)
            .await;

        Ok(())
    }

    /// Make both endpoints fail with 503.
    pub async fn go_down(&self) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    /// Number of JWKS requests received since the last `publish`/`go_down`.
    pub async fn jwks_fetch_count(&self) -> usize {
        self.count_path(JWKS_PATH).await
    }

    /// Number of discovery-document requests received since the last reset.
    pub async fn discovery_fetch_count(&self) -> usize {
        self.count_path(DISCOVERY_PATH).await
    }

    async fn count_path(&self, wanted: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == wanted)
            .count()
    }
}

/// Build a JWKS document for `keys`.
pub fn jwks_document(keys: &[PublishedKey]) -> Result<Value, FixtureError> {
    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let (n, e) = rsa_jwk_components(key.pem)?;
        entries.push(json!({
            "kty": "RSA",
            "use": "sig",
            "kid": key.kid,
            "n": n,
            "e": e,
        }));
    }
    Ok(json!({ "keys": entries }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::crypto_fixtures::{IDP_KEY_A_PEM, IDP_KEY_B_PEM};

    #[test]
    fn test_jwks_document_lists_every_key() {
        let doc = jwks_document(&[
            PublishedKey { kid: "a", pem: IDP_KEY_A_PEM },
            PublishedKey { kid: "b", pem: IDP_KEY_B_PEM },
        ])
        .unwrap();

        let keys = doc["keys"].as_array().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0]["kid"], "a");
        assert_eq!(keys[1]["kty"], "RSA");
    }

    #[tokio::test]
    async fn test_discovery_document_points_at_jwks() {
        let idp = MockIdentityProvider::start(&[PublishedKey {
            kid: "a",
            pem: IDP_KEY_A_PEM,
        }])
        .await
        .unwrap();

        let url = format!("{}.well-known/openid-configuration", idp.issuer());
        let doc: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(doc["issuer"], idp.issuer());

        let jwks: Value = reqwest::get(doc["jwks_uri"].as_str().unwrap())
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(jwks["keys"][0]["kid"], "a");
        assert_eq!(idp.jwks_fetch_count().await, 1);
        assert_eq!(idp.discovery_fetch_count().await, 1);
    }
}
