use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Segment separator of a permission key.
pub const SEPARATOR: char = ':';

/// Wildcard segment.
pub const WILDCARD: &str = "*";

/// Permission identifier as granted to a principal.
///
/// Permissions are `"resource:action"` strings (e.g. `"user:read"`). A granted
/// permission may use `"*"` for either segment: `"user:*"` covers every action
/// on users, `"*:*"` covers everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse a permission from an untrusted list; blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(Cow::Owned(trimmed.to_string())))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.key().is_some_and(|k| k.resource == WILDCARD || k.action == WILDCARD)
    }

    /// Split into `(resource, action)` if this is a well-formed two-segment key.
    pub fn key(&self) -> Option<PermissionKey<'_>> {
        PermissionKey::parse(self.as_str())
    }

    /// Whether this granted permission covers the `requested` key.
    ///
    /// Exact string equality always matches. Otherwise both sides must be
    /// two-segment keys and each granted segment must equal the requested
    /// segment or be `"*"`. Keys with any other segment count never match
    /// through a wildcard.
    pub fn grants(&self, requested: &str) -> bool {
        if self.as_str() == requested {
            return true;
        }
        let (Some(granted), Some(requested)) = (self.key(), PermissionKey::parse(requested)) else {
            return false;
        };
        segment_matches(granted.resource, requested.resource)
            && segment_matches(granted.action, requested.action)
    }
}

fn segment_matches(granted: &str, requested: &str) -> bool {
    granted == WILDCARD || granted == requested
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Borrowed view of a `"resource:action"` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionKey<'a> {
    pub resource: &'a str,
    pub action: &'a str,
}

impl<'a> PermissionKey<'a> {
    /// Exactly two non-empty segments, otherwise `None`.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (resource, action) = raw.split_once(SEPARATOR)?;
        if resource.is_empty() || action.is_empty() || action.contains(SEPARATOR) {
            return None;
        }
        Some(Self { resource, action })
    }

    /// Build the owned key string `"resource:action"`.
    pub fn format(resource: &str, action: &str) -> String {
        format!("{resource}{SEPARATOR}{action}")
    }
}
