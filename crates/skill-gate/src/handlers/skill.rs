//! Webhook handler.
//!
//! Transport rejections become a 400 with a generic body. Denials and
//! authenticated requests both answer 200 with a speech envelope, since the
//! platform only reads the spoken text back to the user.

use crate::auth::AuthDecision;
use crate::errors::GateError;
use crate::routes::AppState;
use crate::skill::SpeechResponse;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use std::sync::Arc;

/// Handler for POST /api/v1/skill
#[tracing::instrument(skip_all, name = "gate.skill.request")]
pub async fn handle_skill_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SpeechResponse>, GateError> {
    if state.shutdown.is_cancelled() {
        return Err(GateError::ShuttingDown);
    }

    // Outbound fetches for this request stop when the server starts draining.
    let cancel = state.shutdown.child_token();

    match state
        .authenticator
        .authenticate(&headers, &body, &cancel)
        .await
    {
        AuthDecision::Rejected(reason) => {
            Err(GateError::RequestRejected(reason.as_str().to_string()))
        }
        AuthDecision::Denied(reason) => Ok(Json(SpeechResponse::plain_text(reason.speech()))),
        AuthDecision::Authenticated(authenticated) => {
            let reply = state
                .router
                .route(
                    &authenticated.principal,
                    &authenticated.token,
                    authenticated.request.intent_name(),
                )
                .await;
            Ok(Json(SpeechResponse::plain_text(reply)))
        }
    }
}
