use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are free-form strings. Three names are reserved and drive scope
/// resolution: `SUPER_ADMIN > TENANT_ADMIN > ORG_ADMIN / USER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPER_ADMIN: Role = Role(Cow::Borrowed("SUPER_ADMIN"));
    pub const TENANT_ADMIN: Role = Role(Cow::Borrowed("TENANT_ADMIN"));
    pub const ORG_ADMIN: Role = Role(Cow::Borrowed("ORG_ADMIN"));
    pub const USER: Role = Role(Cow::Borrowed("USER"));

    /// Prefix some gateways put in front of role names.
    pub const GATEWAY_PREFIX: &'static str = "ROLE_";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse a role coming from an untrusted list (header, claim).
    ///
    /// Trims whitespace, drops a leading `ROLE_` and returns `None` when
    /// nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let name = trimmed.strip_prefix(Self::GATEWAY_PREFIX).unwrap_or(trimmed);
        if name.is_empty() {
            None
        } else {
            Some(Self(Cow::Owned(name.to_string())))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.as_str(), "SUPER_ADMIN" | "TENANT_ADMIN" | "ORG_ADMIN" | "USER")
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
