//! Per-endpoint authorization requirements, as published to gateways.
//!
//! A service's list is a snapshot stamped with a version; a consumer replaces
//! its cached copy whenever the version changes. Paths that no entry matches
//! are denied.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IdentityContext, Permission, Role};

/// Upper bound on a URL pattern's length.
pub const MAX_PATTERN_LEN: usize = 500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointPolicyError {
    #[error("url pattern must not be blank")]
    BlankPattern,

    #[error("url pattern must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("url pattern exceeds {MAX_PATTERN_LEN} characters ({0})")]
    PatternTooLong(usize),

    #[error("'**' is only allowed as the last segment: {0}")]
    MisplacedDoubleWildcard(String),

    #[error("unsupported http method: {0}")]
    UnknownMethod(String),

    #[error("service name must not be blank")]
    BlankServiceName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = EndpointPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(EndpointPolicyError::UnknownMethod(s.to_string())),
        }
    }
}

impl core::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}` or `*`: exactly one segment.
    Single,
    /// Trailing `**`: zero or more segments.
    Rest,
}

/// Validated path pattern (`/api/v1/users/{id}`, `/files/**`).
///
/// Segments are compared literally; `{var}` and `*` match exactly one
/// segment, a trailing `**` matches whatever remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl UrlPattern {
    pub fn new(raw: impl Into<String>) -> Result<Self, EndpointPolicyError> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(EndpointPolicyError::BlankPattern);
        }
        if !raw.starts_with('/') {
            return Err(EndpointPolicyError::MissingLeadingSlash(raw));
        }
        let len = raw.chars().count();
        if len > MAX_PATTERN_LEN {
            return Err(EndpointPolicyError::PatternTooLong(len));
        }

        let parts: Vec<&str> = split_path(&raw).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = match *part {
                "**" if i + 1 == parts.len() => Segment::Rest,
                "**" => return Err(EndpointPolicyError::MisplacedDoubleWildcard(raw)),
                "*" => Segment::Single,
                p if p.len() > 2 && p.starts_with('{') && p.ends_with('}') => Segment::Single,
                p => Segment::Literal(p.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` (no query string) matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        if !path.starts_with('/') {
            return false;
        }
        let mut parts = split_path(path);
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Single => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if parts.next() != Some(lit.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }

    /// Ordering key: more literal segments first, then bounded over open-ended,
    /// then longer patterns.
    fn specificity(&self) -> (usize, bool, usize) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        let bounded = !matches!(self.segments.last(), Some(Segment::Rest));
        (literals, bounded, self.segments.len())
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    trimmed.split('/').filter(|s| !s.is_empty())
}

impl TryFrom<String> for UrlPattern {
    type Error = EndpointPolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UrlPattern> for String {
    fn from(value: UrlPattern) -> Self {
        value.raw
    }
}

impl core::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Authorization requirements of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPolicySpec {
    pub method: HttpMethod,
    pub path_pattern: UrlPattern,
    #[serde(deserialize_with = "service_name_field")]
    pub service_name: String,
    #[serde(default)]
    pub required_roles: BTreeSet<Role>,
    #[serde(default)]
    pub required_permissions: BTreeSet<Permission>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub require_mfa: bool,
}

fn service_name_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(serde::de::Error::custom(EndpointPolicyError::BlankServiceName));
    }
    Ok(trimmed.to_string())
}

impl EndpointPolicySpec {
    pub fn new(
        method: HttpMethod,
        path_pattern: UrlPattern,
        service_name: impl Into<String>,
    ) -> Result<Self, EndpointPolicyError> {
        let service_name = service_name.into().trim().to_string();
        if service_name.is_empty() {
            return Err(EndpointPolicyError::BlankServiceName);
        }
        Ok(Self {
            method,
            path_pattern,
            service_name,
            required_roles: BTreeSet::new(),
            required_permissions: BTreeSet::new(),
            is_public: false,
            require_mfa: false,
        })
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.required_roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.required_permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    pub fn mfa_required(mut self) -> Self {
        self.require_mfa = true;
        self
    }

    /// Same endpoint identity: method and pattern.
    pub fn same_endpoint(&self, other: &EndpointPolicySpec) -> bool {
        self.method == other.method && self.path_pattern.as_str() == other.path_pattern.as_str()
    }

    /// Public endpoints admit everyone. Otherwise the principal must hold one
    /// of the required permissions or one of the required roles; an entry
    /// requiring nothing admits no one.
    pub fn permits(&self, context: &IdentityContext) -> bool {
        if self.is_public {
            return true;
        }
        self.required_permissions
            .iter()
            .any(|p| context.has_permission(p.as_str()))
            || self.required_roles.iter().any(|r| context.has_role(r.as_str()))
    }
}

/// Decision for one `(method, path)` against a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectivePolicy<'a> {
    Listed(&'a EndpointPolicySpec),
    /// No entry matched: deny.
    Unlisted,
}

impl EffectivePolicy<'_> {
    pub fn permits(&self, context: &IdentityContext) -> bool {
        match self {
            EffectivePolicy::Listed(spec) => spec.permits(context),
            EffectivePolicy::Unlisted => false,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, EffectivePolicy::Listed(spec) if spec.is_public)
    }

    pub fn require_mfa(&self) -> bool {
        matches!(self, EffectivePolicy::Listed(spec) if spec.require_mfa)
    }
}

/// Versioned snapshot of a service's endpoint policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPolicyList {
    pub service_name: String,
    /// ISO-8601 timestamp of the last mutation.
    pub version: String,
    pub endpoints: Vec<EndpointPolicySpec>,
}

impl EndpointPolicyList {
    /// Version of a service that has never been written.
    pub const EPOCH_VERSION: &'static str = "1970-01-01T00:00:00Z";

    pub fn empty(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            version: Self::EPOCH_VERSION.to_string(),
            endpoints: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Most specific entry matching `method` and `path`; ties go to the earlier entry.
    pub fn resolve(&self, method: HttpMethod, path: &str) -> EffectivePolicy<'_> {
        let mut best: Option<&EndpointPolicySpec> = None;
        for spec in self
            .endpoints
            .iter()
            .filter(|s| s.method == method && s.path_pattern.matches(path))
        {
            let better = match best {
                None => true,
                Some(current) => spec.path_pattern.specificity() > current.path_pattern.specificity(),
            };
            if better {
                best = Some(spec);
            }
        }
        best.map_or(EffectivePolicy::Unlisted, EffectivePolicy::Listed)
    }
}
