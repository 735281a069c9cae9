use std::collections::BTreeSet;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use authhub_core::{OrganizationId, TenantId, UserId};

use crate::config::JwtValidationConfig;
use crate::error::{ConfigurationError, TokenRejected};
use crate::revocation::RevocationCheck;
use crate::{Permission, Role};

/// JWT claims as they appear on the wire.
///
/// `jti`, `tid`, `oid`, `roles` and `permissions` are optional; `sub`, `iss`
/// and `exp` are enforced by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iss: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// Verified, decoded identity claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub token_id: Option<String>,
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub organization_id: Option<OrganizationId>,
    pub roles: BTreeSet<Role>,
    pub permissions: BTreeSet<Permission>,
}

impl ClaimSet {
    fn from_token(claims: TokenClaims) -> Result<Self, TokenRejected> {
        let user_id = UserId::new(claims.sub).map_err(|_| TokenRejected::Invalid)?;

        Ok(Self {
            token_id: claims.jti.filter(|j| !j.trim().is_empty()),
            user_id,
            tenant_id: TenantId::parse_optional(claims.tid.as_deref()),
            organization_id: OrganizationId::parse_optional(claims.oid.as_deref()),
            roles: claims
                .roles
                .unwrap_or_default()
                .iter()
                .filter_map(|r| Role::parse(r))
                .collect(),
            permissions: claims
                .permissions
                .unwrap_or_default()
                .iter()
                .filter_map(|p| Permission::parse(p))
                .collect(),
        })
    }
}

/// Which key family verifies signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Hmac,
    Rsa,
}

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Verifies bearer tokens and decodes them into a [`ClaimSet`].
///
/// Key material is loaded once at construction; afterwards the extractor is
/// read-only and can be shared behind an `Arc`. Key material is never printed
/// via `Debug`.
#[derive(Clone)]
pub struct TokenClaimsExtractor {
    decoding_key: DecodingKey,
    validation: Validation,
    key_kind: KeyKind,
    revocation: Option<Arc<dyn RevocationCheck>>,
}

impl std::fmt::Debug for TokenClaimsExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClaimsExtractor")
            .field("key_kind", &self.key_kind)
            .field("validation", &self.validation)
            .field("revocation", &self.revocation.is_some())
            .finish()
    }
}

impl TokenClaimsExtractor {
    /// Build an extractor from configuration.
    ///
    /// RSA is used when enabled and the key path is non-blank; an unreadable or
    /// unparsable key is fatal. RSA enabled with a blank path falls back to HMAC.
    pub fn new(config: &JwtValidationConfig) -> Result<Self, ConfigurationError> {
        let (decoding_key, key_kind) = match config.rsa_key_path() {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|e| ConfigurationError::RsaPublicKey {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                let key = DecodingKey::from_rsa_pem(&pem).map_err(|e| {
                    ConfigurationError::RsaPublicKey {
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })?;
                (key, KeyKind::Rsa)
            }
            None => {
                if config.rsa.enabled {
                    tracing::warn!("RSA verification enabled without a key path; falling back to HMAC");
                }
                (DecodingKey::from_secret(config.secret.as_bytes()), KeyKind::Hmac)
            }
        };

        let mut validation = Validation::new(match key_kind {
            KeyKind::Hmac => Algorithm::HS256,
            KeyKind::Rsa => Algorithm::RS256,
        });
        validation.algorithms = match key_kind {
            KeyKind::Hmac => HMAC_ALGORITHMS.to_vec(),
            KeyKind::Rsa => RSA_ALGORITHMS.to_vec(),
        };
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;

        tracing::info!(key_kind = ?key_kind, issuer = %config.issuer, "token claims extractor ready");

        Ok(Self {
            decoding_key,
            validation,
            key_kind,
            revocation: None,
        })
    }

    /// Reject tokens whose `jti` the given store reports as revoked.
    pub fn with_revocation(mut self, revocation: Arc<dyn RevocationCheck>) -> Self {
        self.revocation = Some(revocation);
        self
    }

    pub fn key_kind(&self) -> KeyKind {
        self.key_kind
    }

    /// Verify and decode a bearer token.
    ///
    /// Returns `None` for a missing, blank, malformed, badly signed, expired,
    /// foreign-issuer or revoked token. The reason is logged at debug level only.
    pub fn extract_claims(&self, token: Option<&str>) -> Option<ClaimSet> {
        match self.verify(token) {
            Ok(claims) => Some(claims),
            Err(rejected) => {
                tracing::debug!(reason = rejected.as_str(), "bearer token rejected");
                None
            }
        }
    }

    fn verify(&self, token: Option<&str>) -> Result<ClaimSet, TokenRejected> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenRejected::Blank)?;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = ClaimSet::from_token(data.claims)?;

        if let (Some(revocation), Some(jti)) = (&self.revocation, claims.token_id.as_deref()) {
            if revocation.is_revoked(jti) {
                return Err(TokenRejected::Revoked);
            }
        }
        Ok(claims)
    }
}
