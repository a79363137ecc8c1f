// crates/org-gate-core/src/types.rs
// ============================================================================
// Module: Org Gate Core Types
// Description: Credential, identity, and membership types for the gateway.
// Purpose: Provide stable, serializable types for authorization decisions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the data model of one authorization decision: the
//! caller-supplied credential, the resolved user identity, the organization
//! membership set, and the admission policy applied against it. Credentials
//! are opaque secrets and never appear in debug output or audit records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Credential
// ============================================================================

/// Opaque caller-supplied credential extracted from the authorization header.
///
/// # Invariants
/// - Never persisted; lifetime is a single request.
/// - Debug formatting redacts the secret value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw credential token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for outbound provider requests.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Resolved user identity returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Login handle of the authenticated user.
    pub login: String,
}

impl UserIdentity {
    /// Creates an identity with the given login handle.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

// ============================================================================
// SECTION: Memberships
// ============================================================================

/// Set of organization logins the caller belongs to.
///
/// # Invariants
/// - Logins are deduplicated; iteration order is lexicographic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Organizations(BTreeSet<String>);

impl Organizations {
    /// Creates an empty membership set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true when the set contains the required organization login.
    ///
    /// An empty `required` login never matches; an empty set matches nothing.
    #[must_use]
    pub fn contains_org(&self, required: &str) -> bool {
        if required.is_empty() {
            return false;
        }
        self.0.contains(required)
    }

    /// Returns true when the caller belongs to no organizations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of organizations in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over organization logins in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for Organizations {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for Organizations {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

// ============================================================================
// SECTION: Admission Policy
// ============================================================================

/// Configured rule determining which membership, if any, is required to pass.
///
/// # Invariants
/// - Set once at process start; read-only thereafter.
/// - A restricted policy names exactly one organization login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Any authenticated caller is admitted regardless of memberships.
    Unrestricted,
    /// Callers must belong to the named organization.
    RequiredOrganization(String),
}

impl AdmissionPolicy {
    /// Builds a policy from the configured organization string.
    ///
    /// An empty or whitespace-only string yields the unrestricted policy.
    #[must_use]
    pub fn from_required_org(org: &str) -> Self {
        let trimmed = org.trim();
        if trimmed.is_empty() {
            Self::Unrestricted
        } else {
            Self::RequiredOrganization(trimmed.to_string())
        }
    }

    /// Returns the required organization login, if the policy is restricted.
    #[must_use]
    pub fn required_org(&self) -> Option<&str> {
        match self {
            Self::Unrestricted => None,
            Self::RequiredOrganization(org) => Some(org.as_str()),
        }
    }

    /// Evaluates the membership set against this policy.
    #[must_use]
    pub fn admits(&self, memberships: &Organizations) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::RequiredOrganization(org) => memberships.contains_org(org),
        }
    }
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
        clippy::use_debug,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::AdmissionPolicy;
    use super::Credential;
    use super::Organizations;
    use super::UserIdentity;

    #[test]
    fn contains_org_rejects_empty_required() {
        let orgs: Organizations = ["OrgA"].into_iter().collect();
        assert!(!orgs.contains_org(""));
    }

    #[test]
    fn contains_org_rejects_empty_set() {
        let orgs = Organizations::new();
        assert!(!orgs.contains_org("OrgA"));
    }

    #[test]
    fn contains_org_matches_member() {
        let orgs: Organizations = ["OrgA", "OrgB"].into_iter().collect();
        assert!(orgs.contains_org("OrgA"));
    }

    #[test]
    fn contains_org_is_case_sensitive() {
        let orgs: Organizations = ["OrgA"].into_iter().collect();
        assert!(!orgs.contains_org("orga"));
    }

    #[test]
    fn policy_from_empty_string_is_unrestricted() {
        assert_eq!(AdmissionPolicy::from_required_org(""), AdmissionPolicy::Unrestricted);
        assert_eq!(AdmissionPolicy::from_required_org("   "), AdmissionPolicy::Unrestricted);
    }

    #[test]
    fn policy_trims_configured_org() {
        let policy = AdmissionPolicy::from_required_org(" keke-lab ");
        assert_eq!(policy.required_org(), Some("keke-lab"));
    }

    #[test]
    fn unrestricted_policy_admits_empty_set() {
        let policy = AdmissionPolicy::Unrestricted;
        assert!(policy.admits(&Organizations::new()));
    }

    #[test]
    fn restricted_policy_requires_membership() {
        let policy = AdmissionPolicy::from_required_org("OrgA");
        let member: Organizations = ["OrgA", "OrgB"].into_iter().collect();
        let outsider: Organizations = ["OrgC"].into_iter().collect();
        assert!(policy.admits(&member));
        assert!(!policy.admits(&outsider));
        assert!(!policy.admits(&Organizations::new()));
    }

    #[test]
    fn credential_debug_redacts_token() {
        let credential = Credential::new("tok123");
        let printed = format!("{credential:?}");
        assert!(!printed.contains("tok123"));
    }

    #[test]
    fn identity_serializes_login_field() {
        let identity = UserIdentity::new("alice");
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, r#"{"login":"alice"}"#);
    }

    #[test]
    fn organizations_serialize_as_sorted_array() {
        let orgs: Organizations = ["zeta", "alpha"].into_iter().collect();
        let json = serde_json::to_string(&orgs).unwrap();
        assert_eq!(json, r#"["alpha","zeta"]"#);
    }
}
