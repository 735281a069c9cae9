//! `authhub-auth`: the authorization decision engine.
//!
//! Token verification, the request-scoped identity, and the predicate surface
//! callers branch on. Decoupled from HTTP and storage: every check is a pure
//! read of an already-bound [`IdentityContext`].

pub mod access;
pub mod claims;
pub mod config;
pub mod endpoint_policy;
pub mod error;
pub mod guard;
pub mod holder;
pub mod identity;
pub mod permissions;
pub mod revocation;
pub mod roles;
pub mod scope;
pub mod service;
pub mod tenant_filter;

pub use access::{AccessEvaluator, ActionPolicy, Privilege, ResourceKind};
pub use claims::{ClaimSet, KeyKind, TokenClaims, TokenClaimsExtractor};
pub use config::{JwtValidationConfig, RsaConfig};
pub use endpoint_policy::{
    EffectivePolicy, EndpointPolicyError, EndpointPolicyList, EndpointPolicySpec, HttpMethod,
    UrlPattern,
};
pub use error::{ConfigurationError, PreconditionViolation};
pub use guard::Guard;
pub use holder::ContextHolder;
pub use identity::{IdentityContext, IdentityContextBuilder};
pub use permissions::{Permission, PermissionKey};
pub use revocation::RevocationCheck;
pub use roles::Role;
pub use scope::{Scope, ScopeResolver};
pub use service::{ServiceTokenVerifier, StaticServiceTokens};
pub use tenant_filter::TenantFilterResolver;
