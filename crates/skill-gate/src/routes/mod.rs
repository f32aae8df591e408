//! HTTP routes for Skill Gate.
//!
//! Defines the Axum router and application state.

use crate::auth::RequestAuthenticator;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::skill::IntentRouter;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Signature and token checks for every webhook call.
    pub authenticator: Arc<RequestAuthenticator>,

    /// Produces the reply for authenticated requests.
    pub router: Arc<dyn IntentRouter>,

    /// Cancelled when the server starts shutting down.
    pub shutdown: CancellationToken,
}

/// Build the application routes.
///
/// - `/api/v1/skill` - Webhook endpoint (signature + bearer token)
/// - `/health` - Liveness probe, unversioned
/// - `/metrics` - Prometheus metrics, unversioned
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let app_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/skill", post(handlers::handle_skill_request))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees framework errors too)
    app_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
