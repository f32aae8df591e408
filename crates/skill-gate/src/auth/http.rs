//! Outbound HTTP fetches shared by the certificate store and discovery cache.
//!
//! Every fetch honors both the client timeout and a caller-supplied
//! cancellation token, and caps the body size before buffering it.

use bytes::{Bytes, BytesMut};
use common::error::{Result, SkillGateError};
use reqwest::Url;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Build the HTTP client used for outbound fetches.
///
/// Redirects are never followed, so a fetch cannot leave the URL it was
/// checked against.
///
/// # Errors
///
/// Returns `SkillGateError::Transport` if the client cannot be built (for
/// example when the TLS backend fails to initialize).
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| {
            tracing::error!(target: "gate.auth.http", error = %e, "Failed to build HTTP client");
            SkillGateError::Transport(format!("Failed to build HTTP client: {e}"))
        })
}

/// GET `url` and return the body, failing on non-2xx, oversize bodies or
/// cancellation.
pub async fn fetch_bytes(
    client: &reqwest::Client,
    url: &Url,
    max_bytes: usize,
    cancel: &CancellationToken,
) -> Result<Bytes> {
    let work = async {
        let mut response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SkillGateError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SkillGateError::Transport(format!(
                "Upstream returned status {status}"
            )));
        }

        if let Some(length) = response.content_length() {
            if length > max_bytes as u64 {
                return Err(SkillGateError::Transport(format!(
                    "Response body of {length} bytes exceeds limit of {max_bytes}"
                )));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SkillGateError::Transport(e.to_string()))?
        {
            if body.len() + chunk.len() > max_bytes {
                return Err(SkillGateError::Transport(format!(
                    "Response body exceeds limit of {max_bytes} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    };

    tokio::select! {
        () = cancel.cancelled() => Err(SkillGateError::Cancelled(format!("GET {}", url.path()))),
        result = work => result,
    }
}
