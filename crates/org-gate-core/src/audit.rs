// crates/org-gate-core/src/audit.rs
// ============================================================================
// Module: Decision Audit
// Description: Structured audit events for terminal pipeline outcomes.
// Purpose: Record exactly one event per authorization decision.
// Dependencies: crate::types, serde
// ============================================================================

//! ## Overview
//! Every terminal pipeline state emits exactly one [`DecisionAuditEvent`]
//! through a [`DecisionAuditSink`]. The default sink writes one JSON object
//! per line to stderr; destination and format beyond that are collaborator
//! concerns. Events never carry the raw credential.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::IpAddr;

use serde::Serialize;

use crate::types::Organizations;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Audit event payload for one authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome label.
    pub decision: &'static str,
    /// Human-readable reason or transition message.
    pub reason: String,
    /// Rejected authorization scheme (malformed-scheme events only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Underlying provider error text (upstream-failure events only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Organization required by the admission policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_organization: Option<String>,
    /// Caller's organization membership set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizations: Option<Organizations>,
    /// Login of the resolved identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Caller IP address when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_ip: Option<String>,
    /// Request path when the transport knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DecisionAuditEvent {
    /// Builds an event skeleton with the shared fields set.
    fn base(decision: &'static str, reason: impl Into<String>, peer_ip: Option<IpAddr>) -> Self {
        Self {
            event: "gateway_decision",
            decision,
            reason: reason.into(),
            scheme: None,
            error: None,
            allowed_organization: None,
            organizations: None,
            user: None,
            peer_ip: peer_ip.map(|ip| ip.to_string()),
            path: None,
        }
    }

    /// Builds a malformed-credential event.
    #[must_use]
    pub fn malformed(
        reason: impl Into<String>,
        scheme: Option<&str>,
        peer_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            scheme: scheme.map(str::to_string),
            ..Self::base("malformed", reason, peer_ip)
        }
    }

    /// Builds an upstream-failure event carrying the provider error text.
    #[must_use]
    pub fn upstream_failure(
        reason: impl Into<String>,
        error: impl Into<String>,
        peer_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base("upstream_failure", reason, peer_ip)
        }
    }

    /// Builds an allow event for the unrestricted-policy bypass.
    #[must_use]
    pub fn bypass(
        reason: impl Into<String>,
        organizations: &Organizations,
        user: &str,
        peer_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            organizations: Some(organizations.clone()),
            user: Some(user.to_string()),
            ..Self::base("allow", reason, peer_ip)
        }
    }

    /// Builds an allow event for a satisfied restricted policy.
    #[must_use]
    pub fn allowed(
        reason: impl Into<String>,
        allowed_organization: &str,
        organizations: &Organizations,
        user: &str,
        peer_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            allowed_organization: Some(allowed_organization.to_string()),
            organizations: Some(organizations.clone()),
            user: Some(user.to_string()),
            ..Self::base("allow", reason, peer_ip)
        }
    }

    /// Builds a deny event for a failed restricted policy.
    #[must_use]
    pub fn denied(
        reason: impl Into<String>,
        allowed_organization: &str,
        organizations: &Organizations,
        user: &str,
        peer_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            allowed_organization: Some(allowed_organization.to_string()),
            organizations: Some(organizations.clone()),
            user: Some(user.to_string()),
            ..Self::base("deny", reason, peer_ip)
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for authorization decisions.
pub trait DecisionAuditSink: Send + Sync {
    /// Records a decision audit event.
    fn record(&self, event: &DecisionAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl DecisionAuditSink for StderrAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let mut stderr = std::io::stderr();
            let _ = writeln!(&mut stderr, "{payload}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl DecisionAuditSink for NoopAuditSink {
    fn record(&self, _event: &DecisionAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::DecisionAuditEvent;
    use crate::types::Organizations;

    #[test]
    fn malformed_event_carries_scheme() {
        let event = DecisionAuditEvent::malformed("token type should be bearer type", Some("oauth"), None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["decision"], "malformed");
        assert_eq!(json["scheme"], "oauth");
        assert!(json.get("organizations").is_none());
    }

    #[test]
    fn allowed_event_carries_policy_fields() {
        let orgs: Organizations = ["keke-lab", "other"].into_iter().collect();
        let event =
            DecisionAuditEvent::allowed("organization belonging user", "keke-lab", &orgs, "alice", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["decision"], "allow");
        assert_eq!(json["allowed_organization"], "keke-lab");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["organizations"][0], "keke-lab");
    }

    #[test]
    fn upstream_event_carries_error_text() {
        let event = DecisionAuditEvent::upstream_failure(
            "error while getting user info",
            "request failed with status code 500 with message boom",
            None,
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["decision"], "upstream_failure");
        assert!(json["error"].as_str().unwrap().contains("500"));
    }
}
