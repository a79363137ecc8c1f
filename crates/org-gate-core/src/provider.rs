// crates/org-gate-core/src/provider.rs
// ============================================================================
// Module: Identity Provider Interface
// Description: Backend-agnostic identity and membership resolution.
// Purpose: Decouple the decision pipeline from the remote identity service.
// Dependencies: crate::types, thiserror
// ============================================================================

//! ## Overview
//! The pipeline consumes the identity provider purely through this interface:
//! resolve a credential to a user identity, and resolve the same credential
//! to the caller's organization memberships. Implementations perform one
//! outbound request per call with no retries and no caching; the pipeline
//! treats every failure as opaque and non-retryable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::types::Credential;
use crate::types::Organizations;
use crate::types::UserIdentity;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identity provider errors.
///
/// The pipeline collapses all variants to a single upstream-failure outcome;
/// the distinction exists only to enrich audit records.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The outbound request could not be completed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("request failed with status code {code} with message {message}")]
    Status {
        /// Remote HTTP status code.
        code: u16,
        /// Provider-supplied error message, possibly empty.
        message: String,
    },
    /// A success-path response body could not be decoded.
    #[error("response decode error: {0}")]
    Decode(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Backend-agnostic identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Resolves the credential to the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the identity cannot be fetched or the
    /// response cannot be decoded.
    fn fetch_identity(&self, credential: &Credential) -> Result<UserIdentity, ProviderError>;

    /// Resolves the credential to the caller's organization memberships.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when memberships cannot be fetched or the
    /// response cannot be decoded. A malformed success body is a decode
    /// error, never an empty set.
    fn fetch_memberships(&self, credential: &Credential) -> Result<Organizations, ProviderError>;
}

impl<P: IdentityProvider + ?Sized> IdentityProvider for Arc<P> {
    fn fetch_identity(&self, credential: &Credential) -> Result<UserIdentity, ProviderError> {
        self.as_ref().fetch_identity(credential)
    }

    fn fetch_memberships(&self, credential: &Credential) -> Result<Organizations, ProviderError> {
        self.as_ref().fetch_memberships(credential)
    }
}
