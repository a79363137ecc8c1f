// crates/org-gate-config/src/lib.rs
// ============================================================================
// Module: Org Gate Config Library
// Description: Canonical config model and validation for the gateway.
// Purpose: Single source of truth for org-gate.toml semantics.
// Dependencies: org-gate-core, org-gate-github, serde, toml
// ============================================================================

//! ## Overview
//! `org-gate-config` defines the canonical configuration model for Org Gate.
//! Configuration is loaded from a TOML file with strict size and path limits;
//! invalid configuration fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::OrgGateConfig;
pub use config::PolicyConfig;
pub use config::ServerConfig;
