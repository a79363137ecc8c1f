// crates/org-gate-config/src/config.rs
// ============================================================================
// Module: Org Gate Configuration
// Description: Configuration loading and validation for Org Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: org-gate-core, org-gate-github, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file path comes from an explicit argument, the `ORG_GATE_CONFIG`
//! environment variable, or the `org-gate.toml` default; when neither an
//! argument nor the environment names a file and the default is absent, the
//! built-in defaults apply. Invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use org_gate_core::AdmissionPolicy;
use org_gate_github::GithubClientConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "org-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "ORG_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default server bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Maximum length of the configured organization login.
pub(crate) const MAX_ORGANIZATION_LENGTH: usize = 255;
/// Minimum allowed provider timeout in milliseconds.
pub(crate) const MIN_PROVIDER_TIMEOUT_MS: u64 = 100;
/// Maximum allowed provider timeout in milliseconds.
pub(crate) const MAX_PROVIDER_TIMEOUT_MS: u64 = 30_000;
/// Maximum allowed provider response size in bytes.
pub(crate) const MAX_PROVIDER_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Org Gate gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrgGateConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Identity provider client configuration.
    pub github: GithubClientConfig,
    /// Admission policy configuration.
    pub policy: PolicyConfig,
}

impl OrgGateConfig {
    /// Loads configuration from the resolved path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated. A missing file is only an error when the path was named
    /// explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        validate_github(&self.github)?;
        self.policy.validate()?;
        Ok(())
    }

    /// Returns the admission policy derived from the policy section.
    #[must_use]
    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::from_required_org(&self.policy.organization)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl ServerConfig {
    /// Validates the bind address.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr().map(|_| ())
    }

    /// Parses the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address cannot be parsed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }
}

/// Admission policy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Required organization login; empty means unrestricted.
    pub organization: String,
}

impl PolicyConfig {
    /// Validates the configured organization login.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.organization.len() > MAX_ORGANIZATION_LENGTH {
            return Err(ConfigError::Invalid("policy organization exceeds max length".to_string()));
        }
        if self.organization.chars().any(char::is_whitespace)
            && !self.organization.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "policy organization must not contain whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an argument or environment defaults.
///
/// The boolean is true when the path was named explicitly (argument or
/// environment variable) and a missing file must therefore be an error.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates config path length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the identity provider client section.
fn validate_github(github: &GithubClientConfig) -> Result<(), ConfigError> {
    if github.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("github base_url must be non-empty".to_string()));
    }
    let cleartext = github.base_url.starts_with("http://");
    if cleartext && !github.allow_http {
        return Err(ConfigError::Invalid(
            "github base_url requires https unless allow_http is set".to_string(),
        ));
    }
    if !cleartext && !github.base_url.starts_with("https://") {
        return Err(ConfigError::Invalid("github base_url must use http or https".to_string()));
    }
    if github.timeout_ms < MIN_PROVIDER_TIMEOUT_MS || github.timeout_ms > MAX_PROVIDER_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "github timeout_ms must be within {MIN_PROVIDER_TIMEOUT_MS}..={MAX_PROVIDER_TIMEOUT_MS}"
        )));
    }
    if github.max_response_bytes == 0 || github.max_response_bytes > MAX_PROVIDER_RESPONSE_BYTES {
        return Err(ConfigError::Invalid("github max_response_bytes out of range".to_string()));
    }
    if github.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("github user_agent must be non-empty".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
