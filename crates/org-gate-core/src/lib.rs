// crates/org-gate-core/src/lib.rs
// ============================================================================
// Module: Org Gate Core Library
// Description: Public API surface for the Org Gate decision core.
// Purpose: Expose the authorization pipeline, identity interfaces, and audit hooks.
// Dependencies: crate::{audit, pipeline, provider, types}
// ============================================================================

//! ## Overview
//! Org Gate core provides the authorization decision pipeline for the
//! gateway: credential framing, identity resolution, membership evaluation,
//! and the terminal outcome model. It is transport-agnostic and integrates
//! through explicit interfaces rather than embedding into an HTTP framework.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod pipeline;
pub mod provider;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DecisionAuditEvent;
pub use audit::DecisionAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use pipeline::DecisionPipeline;
pub use pipeline::GatewayRequest;
pub use pipeline::Outcome;
pub use provider::IdentityProvider;
pub use provider::ProviderError;
pub use types::AdmissionPolicy;
pub use types::Credential;
pub use types::Organizations;
pub use types::UserIdentity;
