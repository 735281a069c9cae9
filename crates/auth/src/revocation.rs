//! Revoked-token lookup consulted by the [`TokenClaimsExtractor`](crate::TokenClaimsExtractor).
//!
//! Tokens are revoked by `jti` (logout, password change, compromise). The
//! extractor asks only after the signature, issuer and expiry checks pass, so
//! a revocation store never sees forged ids.

use std::sync::Arc;

/// Answers whether a token id has been revoked.
pub trait RevocationCheck: Send + Sync {
    fn is_revoked(&self, token_id: &str) -> bool;
}

impl<T> RevocationCheck for Arc<T>
where
    T: RevocationCheck + ?Sized,
{
    fn is_revoked(&self, token_id: &str) -> bool {
        (**self).is_revoked(token_id)
    }
}
