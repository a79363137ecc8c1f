// crates/org-gate-server/src/lib.rs
// ============================================================================
// Module: Org Gate Server Library
// Description: HTTP transport for the authorization gateway.
// Purpose: Expose the gateway server, handlers, and outcome rendering.
// Dependencies: crate::server
// ============================================================================

//! ## Overview
//! `org-gate-server` exposes the decision pipeline over HTTP with axum:
//! every path except the health endpoint runs one pipeline execution and
//! renders its outcome at a single boundary point.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use server::GatewayServer;
pub use server::GatewayServerError;
pub use server::render_outcome;
