// crates/org-gate-server/src/server.rs
// ============================================================================
// Module: Gateway Server
// Description: axum HTTP server hosting the authorization pipeline.
// Purpose: Map inbound requests to pipeline decisions and render outcomes.
// Dependencies: org-gate-core, org-gate-github, axum, tokio
// ============================================================================

//! ## Overview
//! The gateway server routes every path except `/healthz` through one
//! pipeline execution. The identity provider is blocking, so handlers shift
//! to a blocking context on multi-thread runtimes. Outcomes are rendered to
//! HTTP responses at a single boundary; shutdown drains in-flight requests
//! before the process exits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use org_gate_config::OrgGateConfig;
use org_gate_core::DecisionPipeline;
use org_gate_core::GatewayRequest;
use org_gate_core::IdentityProvider;
use org_gate_core::Outcome;
use org_gate_core::StderrAuditSink;
use org_gate_core::pipeline::MSG_BYPASS_ALLOWED;
use org_gate_github::GithubClient;

// ============================================================================
// SECTION: Gateway Server
// ============================================================================

/// Gateway server instance.
pub struct GatewayServer {
    /// Validated server configuration.
    config: OrgGateConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl GatewayServer {
    /// Builds a gateway server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServerError`] when configuration is invalid or the
    /// identity provider client cannot be created.
    pub fn from_config(config: OrgGateConfig) -> Result<Self, GatewayServerError> {
        config.validate().map_err(|err| GatewayServerError::Config(err.to_string()))?;
        let provider = GithubClient::new(config.github.clone())
            .map_err(|err| GatewayServerError::Init(err.to_string()))?;
        let pipeline = DecisionPipeline::new(
            Arc::new(provider) as Arc<dyn IdentityProvider>,
            config.admission_policy(),
            Arc::new(StderrAuditSink),
        );
        let state = Arc::new(ServerState {
            pipeline,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Serves requests until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), GatewayServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| GatewayServerError::Config(err.to_string()))?;
        let app = build_router(self.state);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| GatewayServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|_| GatewayServerError::Transport("http server failed".to_string()))
    }
}

/// Shared server state for gateway handlers.
struct ServerState {
    /// Decision pipeline shared across requests.
    pipeline: DecisionPipeline<Arc<dyn IdentityProvider>>,
}

/// Builds the gateway router over the shared state.
fn build_router(state: Arc<ServerState>) -> Router {
    Router::new().route("/healthz", get(handle_health)).fallback(handle_gateway).with_state(state)
}

/// Resolves when the process receives a termination signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                let _ = signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles health probes.
async fn handle_health() -> StatusCode {
    StatusCode::OK
}

/// Handles one gateway request end to end.
async fn handle_gateway(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let auth_header =
        headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
    let request =
        GatewayRequest::new(auth_header).with_peer_ip(peer.ip()).with_path(uri.path());
    let outcome = decide_with_blocking(&state, &request);
    render_outcome(&outcome)
}

/// Executes a pipeline decision, shifting to a blocking context when available.
fn decide_with_blocking(state: &ServerState, request: &GatewayRequest) -> Outcome {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| state.pipeline.decide(request))
        }
        _ => state.pipeline.decide(request),
    }
}

// ============================================================================
// SECTION: Outcome Rendering
// ============================================================================

/// Renders a pipeline outcome to its HTTP response.
///
/// This is the single boundary between the decision model and the
/// transport: status codes, bodies, and headers are produced nowhere else.
#[must_use]
pub fn render_outcome(outcome: &Outcome) -> Response {
    match outcome {
        Outcome::Allowed {
            identity,
            bypass,
        } => {
            if *bypass {
                return (StatusCode::OK, MSG_BYPASS_ALLOWED).into_response();
            }
            match serde_json::to_vec(identity) {
                Ok(body) => (
                    StatusCode::OK,
                    [(CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response(),
                Err(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "failed to marshal body").into_response()
                }
            }
        }
        Outcome::Denied {
            reason,
        } => (StatusCode::FORBIDDEN, reason.clone()).into_response(),
        Outcome::Malformed {
            reason,
        } => (StatusCode::BAD_REQUEST, reason.clone()).into_response(),
        Outcome::UpstreamFailure {
            reason,
        } => (StatusCode::BAD_GATEWAY, reason.clone()).into_response(),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
