// crates/org-gate-server/src/server/tests.rs
// ============================================================================
// Module: Gateway Server Tests
// Description: Unit tests for outcome rendering and handler wiring.
// Purpose: Validate the outcome-to-response boundary and blocking dispatch.
// Dependencies: crate::server, org-gate-core, tokio
// ============================================================================

//! ## Overview
//! Covers the single rendering boundary for every outcome variant and the
//! blocking dispatch path used by the gateway handler.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use org_gate_core::AdmissionPolicy;
use org_gate_core::Credential;
use org_gate_core::DecisionPipeline;
use org_gate_core::GatewayRequest;
use org_gate_core::IdentityProvider;
use org_gate_core::NoopAuditSink;
use org_gate_core::Organizations;
use org_gate_core::Outcome;
use org_gate_core::ProviderError;
use org_gate_core::UserIdentity;
use org_gate_core::pipeline::MSG_BYPASS_ALLOWED;
use org_gate_core::pipeline::MSG_NOT_MEMBER;

use super::ServerState;
use super::decide_with_blocking;
use super::render_outcome;

/// Provider stub returning a fixed identity and membership set.
struct StubProvider;

impl IdentityProvider for StubProvider {
    fn fetch_identity(&self, _credential: &Credential) -> Result<UserIdentity, ProviderError> {
        Ok(UserIdentity::new("alice"))
    }

    fn fetch_memberships(&self, _credential: &Credential) -> Result<Organizations, ProviderError> {
        Ok(["keke-lab"].into_iter().collect())
    }
}

/// Collects a response body into bytes.
async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap().to_vec()
}

#[tokio::test]
async fn member_allow_renders_json_identity() {
    let outcome = Outcome::Allowed {
        identity: UserIdentity::new("alice"),
        bypass: false,
    };
    let response = render_outcome(&outcome);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    let body = body_bytes(response).await;
    let decoded: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(decoded["login"], "alice");
}

#[tokio::test]
async fn bypass_allow_renders_plain_message() {
    let outcome = Outcome::Allowed {
        identity: UserIdentity::new("alice"),
        bypass: true,
    };
    let response = render_outcome(&outcome);
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(body, MSG_BYPASS_ALLOWED.as_bytes());
}

#[tokio::test]
async fn denied_renders_forbidden_with_reason() {
    let outcome = Outcome::Denied {
        reason: MSG_NOT_MEMBER.to_string(),
    };
    let response = render_outcome(&outcome);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_bytes(response).await;
    assert_eq!(body, MSG_NOT_MEMBER.as_bytes());
}

#[tokio::test]
async fn malformed_renders_bad_request() {
    let outcome = Outcome::Malformed {
        reason: "no authorization header".to_string(),
    };
    let response = render_outcome(&outcome);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_failure_renders_bad_gateway() {
    let outcome = Outcome::UpstreamFailure {
        reason: "error while getting user info".to_string(),
    };
    let response = render_outcome(&outcome);
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_dispatch_runs_on_multi_thread_runtime() {
    let pipeline = DecisionPipeline::new(
        Arc::new(StubProvider) as Arc<dyn IdentityProvider>,
        AdmissionPolicy::from_required_org("keke-lab"),
        Arc::new(NoopAuditSink),
    );
    let state = ServerState {
        pipeline,
    };
    let request = GatewayRequest::new(Some("Bearer tok123".to_string()));
    let outcome = decide_with_blocking(&state, &request);
    assert_eq!(
        outcome,
        Outcome::Allowed {
            identity: UserIdentity::new("alice"),
            bypass: false
        }
    );
}

#[test]
fn blocking_dispatch_runs_without_runtime() {
    let pipeline = DecisionPipeline::new(
        Arc::new(StubProvider) as Arc<dyn IdentityProvider>,
        AdmissionPolicy::Unrestricted,
        Arc::new(NoopAuditSink),
    );
    let state = ServerState {
        pipeline,
    };
    let request = GatewayRequest::new(Some("Bearer tok123".to_string()));
    let outcome = decide_with_blocking(&state, &request);
    assert!(matches!(outcome, Outcome::Allowed { bypass: true, .. }));
}
