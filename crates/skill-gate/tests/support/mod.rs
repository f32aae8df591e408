//! Test server harness for endpoint tests.
//!
//! Spawns the real router on a random port. The signing certificate is served
//! by a static store, since the trusted certificate URL names the platform's
//! real host. Tokens are verified against a wiremock identity provider.

use metrics_exporter_prometheus::PrometheusBuilder;
use skill_gate::auth::certificate::mock::StaticCertificateStore;
use skill_gate::auth::{
    Certificate, DiscoveryCache, RequestAuthenticator, RevocationMode, SignatureVerifier,
    TokenValidator, TrustAnchors,
};
use skill_gate::routes::{self, AppState};
use skill_gate::skill::AccountIntentRouter;
use skill_test_utils::{
    sign_body, MockIdentityProvider, PublishedKey, TestPki, TestTokenBuilder, IDP_KEY_A_PEM,
    TRUSTED_CERT_URL, VENDOR_KEY_PEM,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const KEY_A: PublishedKey = PublishedKey {
    kid: "key-a",
    pem: IDP_KEY_A_PEM,
};

pub struct TestGateServer {
    addr: SocketAddr,
    idp: MockIdentityProvider,
    store: Arc<StaticCertificateStore>,
    shutdown: CancellationToken,
    _handle: JoinHandle<()>,
}

impl TestGateServer {
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let pki = TestPki::new()?;
        let vendor = pki.vendor().build()?;
        let store = Arc::new(StaticCertificateStore::serving(Certificate::parse(
            vendor.chain_pem.as_bytes(),
        )?));
        let anchors = Arc::new(TrustAnchors::from_pem(pki.root_pem().as_bytes())?);
        let verifier = SignatureVerifier::new(store.clone(), anchors, RevocationMode::NoCheck);

        let idp = MockIdentityProvider::start(&[KEY_A]).await?;
        let discovery = Arc::new(DiscoveryCache::with_issuer(
            &idp.issuer(),
            Duration::from_secs(5),
            Duration::from_secs(3600),
        )?);
        let validator = TokenValidator::new(discovery);

        let shutdown = CancellationToken::new();
        let state = Arc::new(AppState {
            authenticator: Arc::new(RequestAuthenticator::new(verifier, validator)),
            router: Arc::new(AccountIntentRouter),
            shutdown: shutdown.clone(),
        });

        // Recorder is built but not installed, so every test server gets its own.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            idp,
            store,
            shutdown,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn idp(&self) -> &MockIdentityProvider {
        &self.idp
    }

    pub fn store(&self) -> &StaticCertificateStore {
        &self.store
    }

    /// Start refusing webhook calls, as a draining server does.
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// A token the gate accepts for `alice@example.com`.
    pub fn valid_token(&self) -> Result<String, anyhow::Error> {
        Ok(TestTokenBuilder::new(&self.idp.issuer())
            .with_kid("key-a")
            .for_user("alice@example.com")
            .sign(IDP_KEY_A_PEM)?)
    }

    /// POST `body` to the webhook with a valid platform signature over `signed`.
    pub async fn post_signed(
        &self,
        signed: &[u8],
        body: Vec<u8>,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let signature = sign_body(VENDOR_KEY_PEM, signed)?;
        Ok(reqwest::Client::new()
            .post(format!("{}/api/v1/skill", self.url()))
            .header("SignatureCertChainUrl", TRUSTED_CERT_URL)
            .header("Signature", signature)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?)
    }
}

impl Drop for TestGateServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
