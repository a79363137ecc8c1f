// crates/org-gate-core/src/pipeline.rs
// ============================================================================
// Module: Authorization Pipeline
// Description: Per-request authorization decision state machine.
// Purpose: Map one inbound credential to exactly one terminal outcome.
// Dependencies: crate::{audit, provider, types}
// ============================================================================

//! ## Overview
//! The pipeline processes exactly one request per invocation: extract and
//! validate the credential framing, resolve identity and memberships through
//! the [`IdentityProvider`], apply the admission policy, and return a tagged
//! [`Outcome`]. Each terminal state records exactly one audit event. All
//! upstream failures surface immediately; there are no retries. The only
//! state shared across invocations is the read-only policy and the provider
//! handle, so concurrent requests need no locking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::sync::Arc;

use crate::audit::DecisionAuditEvent;
use crate::audit::DecisionAuditSink;
use crate::provider::IdentityProvider;
use crate::types::AdmissionPolicy;
use crate::types::Credential;
use crate::types::UserIdentity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reason recorded when the authorization header is absent or empty.
pub const MSG_NO_AUTH_HEADER: &str = "no authorization header";
/// Reason recorded when the header does not split into scheme and token.
pub const MSG_BAD_REQUEST: &str = "bad request";
/// Reason recorded when the scheme is not bearer.
pub const MSG_BEARER_REQUIRED: &str = "token type should be bearer type";
/// Reason recorded when the identity fetch fails.
pub const MSG_USER_INFO_FAILED: &str = "error while getting user info";
/// Reason recorded when the membership fetch fails.
pub const MSG_ORG_INFO_FAILED: &str = "error while getting user's organization info";
/// Reason recorded when the unrestricted policy admits the caller.
pub const MSG_BYPASS_ALLOWED: &str = "user is allowed to bypass with any organization";
/// Reason recorded when a restricted policy admits the caller.
pub const MSG_ORG_MEMBER: &str = "organization belonging user";
/// Reason recorded when a restricted policy rejects the caller.
pub const MSG_NOT_MEMBER: &str = "user is not a member of allowed orgs";

/// Upper bound on accepted authorization header length.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Transport-agnostic view of one inbound request.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    /// Single value of the authorization header, when present.
    pub auth_header: Option<String>,
    /// Peer IP address, when the transport knows it.
    pub peer_ip: Option<IpAddr>,
    /// Request path, when the transport knows it.
    pub path: Option<String>,
}

impl GatewayRequest {
    /// Builds a request from the authorization header value.
    #[must_use]
    pub fn new(auth_header: Option<String>) -> Self {
        Self {
            auth_header,
            peer_ip: None,
            path: None,
        }
    }

    /// Returns a copy with the peer IP set.
    #[must_use]
    pub const fn with_peer_ip(mut self, peer_ip: IpAddr) -> Self {
        self.peer_ip = Some(peer_ip);
        self
    }

    /// Returns a copy with the request path set.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Terminal decision of one pipeline execution, mapped 1:1 to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The caller is admitted.
    Allowed {
        /// Resolved identity of the caller.
        identity: UserIdentity,
        /// True when the unrestricted policy admitted the caller, in which
        /// case the response body is the bypass message rather than the
        /// serialized identity.
        bypass: bool,
    },
    /// A restricted policy rejected the caller.
    Denied {
        /// Rejection message returned to the caller.
        reason: String,
    },
    /// The credential framing was invalid.
    Malformed {
        /// Validation message returned to the caller.
        reason: String,
    },
    /// The identity provider could not answer.
    UpstreamFailure {
        /// Failure message returned to the caller.
        reason: String,
    },
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Authorization decision pipeline.
///
/// # Invariants
/// - Identity and memberships are always fetched together before the admit
///   step; an [`Outcome`] is never produced without both or an explicit
///   failure reason.
/// - Each terminal state records exactly one audit event.
pub struct DecisionPipeline<P> {
    /// Identity provider handle.
    provider: P,
    /// Admission policy applied to resolved memberships.
    policy: AdmissionPolicy,
    /// Sink receiving one event per decision.
    audit: Arc<dyn DecisionAuditSink>,
}

impl<P: IdentityProvider> DecisionPipeline<P> {
    /// Builds a pipeline over the given provider, policy, and audit sink.
    pub fn new(provider: P, policy: AdmissionPolicy, audit: Arc<dyn DecisionAuditSink>) -> Self {
        Self {
            provider,
            policy,
            audit,
        }
    }

    /// Returns the configured admission policy.
    #[must_use]
    pub const fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Runs the decision state machine for one request.
    #[must_use]
    pub fn decide(&self, request: &GatewayRequest) -> Outcome {
        let credential = match extract_credential(request.auth_header.as_deref()) {
            Ok(credential) => credential,
            Err(rejection) => {
                self.record(
                    DecisionAuditEvent::malformed(
                        rejection.reason,
                        rejection.scheme.as_deref(),
                        request.peer_ip,
                    ),
                    request,
                );
                return Outcome::Malformed {
                    reason: rejection.reason.to_string(),
                };
            }
        };

        let identity = match self.provider.fetch_identity(&credential) {
            Ok(identity) => identity,
            Err(err) => {
                self.record(
                    DecisionAuditEvent::upstream_failure(
                        MSG_USER_INFO_FAILED,
                        err.to_string(),
                        request.peer_ip,
                    ),
                    request,
                );
                return Outcome::UpstreamFailure {
                    reason: MSG_USER_INFO_FAILED.to_string(),
                };
            }
        };

        let memberships = match self.provider.fetch_memberships(&credential) {
            Ok(memberships) => memberships,
            Err(err) => {
                self.record(
                    DecisionAuditEvent::upstream_failure(
                        MSG_ORG_INFO_FAILED,
                        err.to_string(),
                        request.peer_ip,
                    ),
                    request,
                );
                return Outcome::UpstreamFailure {
                    reason: MSG_ORG_INFO_FAILED.to_string(),
                };
            }
        };

        match self.policy.required_org() {
            None => {
                self.record(
                    DecisionAuditEvent::bypass(
                        MSG_BYPASS_ALLOWED,
                        &memberships,
                        &identity.login,
                        request.peer_ip,
                    ),
                    request,
                );
                Outcome::Allowed {
                    identity,
                    bypass: true,
                }
            }
            Some(required) => {
                if self.policy.admits(&memberships) {
                    self.record(
                        DecisionAuditEvent::allowed(
                            MSG_ORG_MEMBER,
                            required,
                            &memberships,
                            &identity.login,
                            request.peer_ip,
                        ),
                        request,
                    );
                    Outcome::Allowed {
                        identity,
                        bypass: false,
                    }
                } else {
                    self.record(
                        DecisionAuditEvent::denied(
                            MSG_NOT_MEMBER,
                            required,
                            &memberships,
                            &identity.login,
                            request.peer_ip,
                        ),
                        request,
                    );
                    Outcome::Denied {
                        reason: MSG_NOT_MEMBER.to_string(),
                    }
                }
            }
        }
    }

    /// Attaches request context and records the event.
    fn record(&self, mut event: DecisionAuditEvent, request: &GatewayRequest) {
        event.path = request.path.clone();
        self.audit.record(&event);
    }
}

// ============================================================================
// SECTION: Credential Extraction
// ============================================================================

/// Rejection detail for invalid credential framing.
struct FramingRejection {
    /// Reason message for the response body and audit record.
    reason: &'static str,
    /// Rejected scheme label, when one was present.
    scheme: Option<String>,
}

/// Validates the authorization header framing and extracts the credential.
///
/// The header must contain exactly two whitespace-separated tokens and the
/// first must be `bearer`, compared case-insensitively.
fn extract_credential(auth_header: Option<&str>) -> Result<Credential, FramingRejection> {
    let header = auth_header.unwrap_or_default();
    if header.trim().is_empty() {
        return Err(FramingRejection {
            reason: MSG_NO_AUTH_HEADER,
            scheme: None,
        });
    }
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(FramingRejection {
            reason: MSG_BAD_REQUEST,
            scheme: None,
        });
    }
    let mut tokens = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(FramingRejection {
            reason: MSG_BAD_REQUEST,
            scheme: None,
        });
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(FramingRejection {
            reason: MSG_BEARER_REQUIRED,
            scheme: Some(scheme.to_string()),
        });
    }
    Ok(Credential::new(token))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
