//! Webhook endpoint integration tests.
//!
//! Runs the real router through `TestGateServer` and checks the three
//! outcomes a caller can see: a 400 transport rejection, a 200 spoken denial
//! and a 200 intent reply.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use serde_json::Value;
use skill_test_utils::{SkillRequestBuilder, TestTokenBuilder, IDP_KEY_A_PEM};
use support::TestGateServer;

fn spoken_text(body: &Value) -> Option<&str> {
    body.pointer("/response/outputSpeech/text")
        .and_then(Value::as_str)
}

// =============================================================================
// Operational endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_404() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/v1/nonexistent", server.url())).await?;

    assert_eq!(response.status(), 404);
    Ok(())
}

// =============================================================================
// Transport rejections
// =============================================================================

#[tokio::test]
async fn test_unsigned_request_rejected_with_generic_error() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let body = SkillRequestBuilder::new()
        .with_access_token(&server.valid_token()?)
        .build();

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/skill", server.url()))
        .body(body)
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(
        body.pointer("/error/code").and_then(Value::as_str),
        Some("REQUEST_REJECTED")
    );
    assert_eq!(
        body.pointer("/error/message").and_then(Value::as_str),
        Some("The request could not be verified")
    );
    assert_eq!(server.store().call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_tampered_body_rejected_before_token_check() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let signed = SkillRequestBuilder::new()
        .with_access_token(&server.valid_token()?)
        .with_intent("Account")
        .build();
    let mut sent = signed.clone();
    sent.push(b' ');

    let response = server.post_signed(&signed, sent).await?;

    assert_eq!(response.status(), 400);
    assert_eq!(server.idp().jwks_fetch_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_stale_timestamp_rejected() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let body = SkillRequestBuilder::new()
        .with_access_token(&server.valid_token()?)
        .timestamp_offset(-600)
        .build();

    let response = server.post_signed(&body, body.clone()).await?;

    assert_eq!(response.status(), 400);
    Ok(())
}

// =============================================================================
// Spoken denials
// =============================================================================

#[tokio::test]
async fn test_missing_session_token_is_spoken_denial() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let body = SkillRequestBuilder::new().with_intent("Account").build();

    let response = server.post_signed(&body, body.clone()).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(
        spoken_text(&body),
        Some("There was a problem with authentication")
    );
    assert_eq!(
        body.pointer("/response/shouldEndSession")
            .and_then(Value::as_bool),
        Some(true)
    );
    Ok(())
}

#[tokio::test]
async fn test_wrong_audience_is_spoken_denial() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let token = TestTokenBuilder::new(&server.idp().issuer())
        .with_kid("key-a")
        .with_audience("some-other-api")
        .sign(IDP_KEY_A_PEM)?;
    let body = SkillRequestBuilder::new()
        .with_access_token(&token)
        .with_intent("Account")
        .build();

    let response = server.post_signed(&body, body.clone()).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(
        spoken_text(&body),
        Some("There was a problem with validating your authentication information")
    );
    Ok(())
}

// =============================================================================
// Authenticated requests
// =============================================================================

#[tokio::test]
async fn test_account_intent_names_linked_user() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let body = SkillRequestBuilder::new()
        .with_access_token(&server.valid_token()?)
        .with_intent("Account")
        .build();

    let response = server.post_signed(&body, body.clone()).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(
        spoken_text(&body),
        Some("You are using alice@example.com's account")
    );
    assert_eq!(server.store().call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_intent_is_declined() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    let body = SkillRequestBuilder::new()
        .with_access_token(&server.valid_token()?)
        .with_intent("pullRequestStatus")
        .build();

    let response = server.post_signed(&body, body.clone()).await?;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(spoken_text(&body), Some("I don't know how to do that yet"));
    Ok(())
}

#[tokio::test]
async fn test_discovery_fetched_once_across_requests() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;

    for _ in 0..3 {
        let body = SkillRequestBuilder::new()
            .with_access_token(&server.valid_token()?)
            .with_intent("Account")
            .build();
        let response = server.post_signed(&body, body.clone()).await?;
        assert_eq!(response.status(), 200);
    }

    assert_eq!(server.idp().discovery_fetch_count().await, 1);
    assert_eq!(server.idp().jwks_fetch_count().await, 1);
    Ok(())
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_draining_server_refuses_webhook_calls() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn().await?;
    server.begin_shutdown();
    let body = SkillRequestBuilder::new()
        .with_access_token(&server.valid_token()?)
        .build();

    let response = server.post_signed(&body, body.clone()).await?;

    assert_eq!(response.status(), 503);
    assert_eq!(server.store().call_count(), 0);

    let health = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(health.status(), 200);
    Ok(())
}
