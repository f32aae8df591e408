//! Skill Gate
//!
//! Entry point for the voice skill webhook gate. Verifies the platform
//! signature and the linked account token on every call before routing the
//! intent.

use common::config::ObservabilityConfig;
use skill_gate::auth::{
    CachingCertificateStore, CertificateStore, DiscoveryCache, HttpCertificateStore,
    RequestAuthenticator, SignatureVerifier, TokenValidator, TrustAnchors,
};
use skill_gate::config::Config;
use skill_gate::observability::metrics::init_metrics_recorder;
use skill_gate::routes::{self, AppState};
use skill_gate::skill::AccountIntentRouter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration decides the log format, so load it before reporting on it.
    let config = Config::from_env();
    let observability = config
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_default();
    init_tracing(&observability);

    info!("Starting Skill Gate");

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(config = ?config, "Configuration loaded successfully");

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        anyhow::anyhow!(e)
    })?;

    let anchors = TrustAnchors::from_pem_file(&config.trust_anchors_path).map_err(|e| {
        error!(
            path = %config.trust_anchors_path.display(),
            "Failed to load trust anchors: {}", e
        );
        e
    })?;
    info!(anchors = anchors.len(), "Trust anchors loaded");

    let http_store: Arc<dyn CertificateStore> = Arc::new(
        HttpCertificateStore::new(config.outbound_timeout).map_err(|e| {
            error!("Failed to create certificate store: {}", e);
            e
        })?,
    );
    let certificate_store: Arc<dyn CertificateStore> = if config.cert_cache_enabled {
        info!("Signing certificate cache enabled");
        Arc::new(CachingCertificateStore::new(http_store))
    } else {
        http_store
    };

    let verifier = SignatureVerifier::new(
        certificate_store,
        Arc::new(anchors),
        config.revocation_mode,
    );

    let discovery = Arc::new(
        DiscoveryCache::new(config.outbound_timeout, config.discovery_refresh).map_err(|e| {
            error!("Failed to create discovery cache: {}", e);
            e
        })?,
    );

    let validator = TokenValidator::new(discovery);

    let authenticator = RequestAuthenticator::new(verifier, validator)
        .with_timestamp_tolerance(config.timestamp_tolerance_seconds)
        .with_debug_pat_auth(config.debug_pat_auth);

    if config.debug_pat_auth {
        warn!("Debug credential mode is on: tokens are read from the Authorization header");
    }

    let shutdown = CancellationToken::new();

    let state = Arc::new(AppState {
        authenticator: Arc::new(authenticator),
        router: Arc::new(AccountIntentRouter),
        shutdown: shutdown.clone(),
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Skill Gate listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    info!("Skill Gate shutdown complete");

    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let json = observability.json_logs;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| observability.log_level.clone().into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
///
/// Cancels `shutdown` first so in-flight fetches stop and new webhook calls
/// get a 503, then waits out the drain period.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    shutdown.cancel();

    let drain_secs: u64 = std::env::var("GATE_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (GATE_DRAIN_SECONDS=0)");
    }
}
