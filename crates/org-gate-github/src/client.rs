// crates/org-gate-github/src/client.rs
// ============================================================================
// Module: GitHub Client
// Description: Blocking GitHub REST client for identity and memberships.
// Purpose: Provide bounded, fail-closed credential exchange with GitHub.
// Dependencies: org-gate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! The GitHub client issues bounded GET requests against `/user` and
//! `/user/orgs`, authenticating with the caller's credential. It enforces a
//! response size limit and a full-lifecycle timeout, never follows
//! redirects, and treats undecodable success bodies as decode errors rather
//! than empty results. The base URL is configurable so tests can substitute
//! a local server; it is immutable after construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use org_gate_core::Credential;
use org_gate_core::IdentityProvider;
use org_gate_core::Organizations;
use org_gate_core::ProviderError;
use org_gate_core::UserIdentity;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::redirect::Policy;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default GitHub API base URL.
pub const GITHUB_BASE_URL: &str = "https://api.github.com";

/// Path suffix for the current-user identity endpoint.
const USER_INFO_PATH: &str = "user";
/// Path suffix for the current-user organizations endpoint.
const USER_ORGS_PATH: &str = "user/orgs";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the GitHub client.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` base URLs.
/// - `max_response_bytes` is a hard upper bound on response bodies.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubClientConfig {
    /// Base URL of the identity service.
    pub base_url: String,
    /// Allow cleartext HTTP base URLs (tests only; disabled by default).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for GithubClientConfig {
    fn default() -> Self {
        Self {
            base_url: GITHUB_BASE_URL.to_string(),
            allow_http: false,
            timeout_ms: 5_000,
            max_response_bytes: 1024 * 1024,
            user_agent: "org-gate/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// GitHub client construction errors.
#[derive(Debug, Error)]
pub enum GithubClientError {
    /// The configured base URL is unusable.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// The underlying HTTP client could not be built.
    #[error("http client build failed")]
    ClientBuild,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Error body attached to non-success GitHub responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    /// Provider-supplied error message.
    #[serde(default)]
    message: String,
    /// Link to provider documentation for the error.
    #[serde(default, rename = "documentationURL")]
    #[allow(dead_code, reason = "Decoded for completeness; only message enriches errors.")]
    documentation_url: String,
}

/// Single organization record in the memberships response.
#[derive(Debug, Deserialize)]
struct OrganizationRecord {
    /// Organization login name.
    login: String,
}

// ============================================================================
// SECTION: Client Implementation
// ============================================================================

/// Blocking GitHub identity provider client.
///
/// # Invariants
/// - One outbound request per call; no retries, no caching.
/// - Redirects are not followed.
pub struct GithubClient {
    /// Client configuration, including limits.
    config: GithubClientConfig,
    /// Validated base URL.
    base_url: Url,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl GithubClient {
    /// Creates a new GitHub client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GithubClientError`] when the base URL is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: GithubClientConfig) -> Result<Self, GithubClientError> {
        let base_url = validate_base_url(&config)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| GithubClientError::ClientBuild)?;
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Issues an authenticated GET and returns the success body bytes.
    fn get_bytes(&self, path: &str, credential: &Credential) -> Result<Vec<u8>, ProviderError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|_| ProviderError::Transport("invalid request path".to_string()))?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", credential.as_str()))
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| ProviderError::Transport(transport_message(&err)))?;
        let status = response.status();
        if status != StatusCode::OK {
            let error = decode_error_body(response, self.config.max_response_bytes);
            return Err(ProviderError::Status {
                code: status.as_u16(),
                message: error.message,
            });
        }
        read_response_limited(response, self.config.max_response_bytes)
    }
}

impl IdentityProvider for GithubClient {
    fn fetch_identity(&self, credential: &Credential) -> Result<UserIdentity, ProviderError> {
        let body = self.get_bytes(USER_INFO_PATH, credential)?;
        serde_json::from_slice(&body)
            .map_err(|err| ProviderError::Decode(format!("user info body: {err}")))
    }

    fn fetch_memberships(&self, credential: &Credential) -> Result<Organizations, ProviderError> {
        let body = self.get_bytes(USER_ORGS_PATH, credential)?;
        let records: Vec<OrganizationRecord> = serde_json::from_slice(&body)
            .map_err(|err| ProviderError::Decode(format!("organizations body: {err}")))?;
        Ok(records.into_iter().map(|record| record.login).collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the configured base URL scheme and shape.
fn validate_base_url(config: &GithubClientConfig) -> Result<Url, GithubClientError> {
    // Url::join treats a base without a trailing slash as a file segment.
    let mut normalized = config.base_url.trim_end_matches('/').to_string();
    normalized.push('/');
    let url = Url::parse(&normalized)
        .map_err(|_| GithubClientError::InvalidBaseUrl(config.base_url.clone()))?;
    match url.scheme() {
        "https" => {}
        "http" if config.allow_http => {}
        _ => return Err(GithubClientError::InvalidBaseUrl(config.base_url.clone())),
    }
    if url.host_str().is_none() {
        return Err(GithubClientError::InvalidBaseUrl(config.base_url.clone()));
    }
    Ok(url)
}

/// Reduces a reqwest error to a transport message without URL internals.
fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        "http request failed".to_string()
    }
}

/// Decodes the optional error body of a non-success response.
///
/// An undecodable or missing error body yields an empty message; the status
/// code alone still identifies the failure.
fn decode_error_body(response: Response, max_bytes: usize) -> ErrorResponse {
    read_response_limited(response, max_bytes)
        .ok()
        .and_then(|body| serde_json::from_slice(&body).ok())
        .unwrap_or_default()
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: Response, max_bytes: usize) -> Result<Vec<u8>, ProviderError> {
    let expected = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ProviderError::Transport("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected
        && expected > max_bytes_u64
    {
        return Err(ProviderError::Transport("response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|_| ProviderError::Transport("failed to read response".to_string()))?;
    if buf.len() > max_bytes {
        return Err(ProviderError::Transport("response exceeds size limit".to_string()));
    }
    Ok(buf)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
