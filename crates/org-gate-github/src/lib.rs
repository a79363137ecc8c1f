// crates/org-gate-github/src/lib.rs
// ============================================================================
// Module: Org Gate GitHub Provider Library
// Description: GitHub-backed identity provider for the gateway.
// Purpose: Resolve credentials to identity and memberships over the GitHub REST API.
// Dependencies: org-gate-core, reqwest
// ============================================================================

//! ## Overview
//! `org-gate-github` implements the [`org_gate_core::IdentityProvider`]
//! interface against the GitHub REST API. Each call is a single bounded GET
//! with no retries; non-success statuses and undecodable bodies fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::GITHUB_BASE_URL;
pub use client::GithubClient;
pub use client::GithubClientConfig;
pub use client::GithubClientError;
