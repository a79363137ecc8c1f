// crates/org-gate-server/tests/gateway_decision.rs
// ============================================================================
// Module: Gateway Decision Tests
// Description: End-to-end decision tests over a stub identity service.
// Purpose: Validate pipeline decisions and HTTP rendering against real sockets.
// Dependencies: org-gate-core, org-gate-github, org-gate-server, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Runs the full decision path: the GitHub client resolves identity and
//! memberships from a local stub service, the pipeline applies the policy,
//! and the outcome is rendered through the server's single response
//! boundary.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::thread;

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use org_gate_core::AdmissionPolicy;
use org_gate_core::DecisionPipeline;
use org_gate_core::GatewayRequest;
use org_gate_core::NoopAuditSink;
use org_gate_core::Outcome;
use org_gate_github::GithubClient;
use org_gate_github::GithubClientConfig;
use org_gate_server::render_outcome;

/// Stub identity service answering `/user` and `/user/orgs`.
struct StubIdentityService {
    /// Base URL of the listening stub.
    base_url: String,
}

impl StubIdentityService {
    /// Starts a stub serving the given bodies for up to `requests` requests.
    fn start(user_body: &'static str, orgs_body: &'static str, requests: usize) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base_url = format!("http://{addr}");
        thread::spawn(move || {
            for _ in 0..requests {
                let Ok(request) = server.recv() else {
                    return;
                };
                let body = if request.url().starts_with("/user/orgs") {
                    orgs_body
                } else {
                    user_body
                };
                let response = tiny_http::Response::from_string(body).with_header(
                    tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"application/json"[..],
                    )
                    .unwrap(),
                );
                let _ = request.respond(response);
            }
        });
        Self {
            base_url,
        }
    }
}

/// Builds a pipeline against the stub with the given policy.
fn pipeline_against(
    stub: &StubIdentityService,
    policy: AdmissionPolicy,
) -> DecisionPipeline<GithubClient> {
    let client = GithubClient::new(GithubClientConfig {
        base_url: stub.base_url.clone(),
        allow_http: true,
        ..GithubClientConfig::default()
    })
    .unwrap();
    DecisionPipeline::new(client, policy, Arc::new(NoopAuditSink))
}

/// Collects a rendered response body into bytes.
fn body_bytes(response: Response) -> Vec<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime
        .block_on(axum::body::to_bytes(response.into_body(), 64 * 1024))
        .unwrap()
        .to_vec()
}

#[test]
fn member_of_required_org_gets_identity_json() {
    let stub = StubIdentityService::start(
        r#"{"login":"alice"}"#,
        r#"[{"login":"keke-lab"},{"login":"other"}]"#,
        2,
    );
    let pipeline = pipeline_against(&stub, AdmissionPolicy::from_required_org("keke-lab"));

    let outcome = pipeline.decide(&GatewayRequest::new(Some("Bearer tok123".to_string())));
    let response = render_outcome(&outcome);

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    let decoded: serde_json::Value = serde_json::from_slice(&body_bytes(response)).unwrap();
    assert_eq!(decoded["login"], "alice");
}

#[test]
fn non_member_is_forbidden() {
    let stub = StubIdentityService::start(r#"{"login":"alice"}"#, r#"[{"login":"other"}]"#, 2);
    let pipeline = pipeline_against(&stub, AdmissionPolicy::from_required_org("keke-lab"));

    let outcome = pipeline.decide(&GatewayRequest::new(Some("Bearer tok123".to_string())));
    let response = render_outcome(&outcome);

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = String::from_utf8(body_bytes(response)).unwrap();
    assert!(body.contains("not a member"));
}

#[test]
fn unrestricted_policy_bypasses_membership() {
    let stub = StubIdentityService::start(r#"{"login":"alice"}"#, "[]", 2);
    let pipeline = pipeline_against(&stub, AdmissionPolicy::Unrestricted);

    let outcome = pipeline.decide(&GatewayRequest::new(Some("Bearer tok123".to_string())));
    let response = render_outcome(&outcome);

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response)).unwrap();
    assert!(body.contains("bypass"));
}

#[test]
fn non_bearer_scheme_never_reaches_the_provider() {
    let stub = StubIdentityService::start(r#"{"login":"alice"}"#, "[]", 0);
    let pipeline = pipeline_against(&stub, AdmissionPolicy::from_required_org("keke-lab"));

    let outcome = pipeline.decide(&GatewayRequest::new(Some("oauth tok123".to_string())));
    assert!(matches!(outcome, Outcome::Malformed { .. }));

    let response = render_outcome(&outcome);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(response)).unwrap();
    assert!(body.contains("bearer"));
}

#[test]
fn missing_header_is_bad_request() {
    let stub = StubIdentityService::start(r#"{"login":"alice"}"#, "[]", 0);
    let pipeline = pipeline_against(&stub, AdmissionPolicy::from_required_org("keke-lab"));

    let outcome = pipeline.decide(&GatewayRequest::new(None));
    let response = render_outcome(&outcome);

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(response)).unwrap();
    assert_eq!(body, "no authorization header");
}

#[test]
fn provider_outage_is_bad_gateway() {
    // Bind then drop a listener so the port is closed.
    let unreachable = {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        format!("http://{addr}")
    };
    let client = GithubClient::new(GithubClientConfig {
        base_url: unreachable,
        allow_http: true,
        ..GithubClientConfig::default()
    })
    .unwrap();
    let pipeline = DecisionPipeline::new(
        client,
        AdmissionPolicy::from_required_org("keke-lab"),
        Arc::new(NoopAuditSink),
    );

    let outcome = pipeline.decide(&GatewayRequest::new(Some("Bearer tok123".to_string())));
    let response = render_outcome(&outcome);

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = String::from_utf8(body_bytes(response)).unwrap();
    assert_eq!(body, "error while getting user info");
}
