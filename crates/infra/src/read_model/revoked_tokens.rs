use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use authhub_auth::RevocationCheck;

/// In-memory revoked-token list for tests/dev.
///
/// Each entry lives until the token's own expiry; past that the signature
/// check already rejects the token, so the entry is dead weight and
/// [`purge_expired`](Self::purge_expired) drops it.
#[derive(Debug, Default)]
pub struct InMemoryRevokedTokens {
    inner: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token_id` until `expires_at`. Blank ids are ignored.
    pub fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) {
        let token_id = token_id.trim();
        if token_id.is_empty() {
            return;
        }
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(token_id.to_string(), expires_at);
        tracing::debug!(token_id, %expires_at, "token revoked");
    }

    /// Drop entries whose token has expired as of `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, expires_at| *expires_at > now);
        let purged = before - map.len();
        if purged > 0 {
            tracing::info!(purged, "expired revocations purged");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RevocationCheck for InMemoryRevokedTokens {
    fn is_revoked(&self, token_id: &str) -> bool {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(token_id)
            .is_some_and(|expires_at| *expires_at > Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn revoked_until_expiry() {
        let store = InMemoryRevokedTokens::new();
        store.revoke("jti-1", Utc::now() + Duration::minutes(5));
        store.revoke("jti-old", Utc::now() - Duration::seconds(1));
        store.revoke("  ", Utc::now() + Duration::minutes(5));

        assert!(store.is_revoked("jti-1"));
        assert!(!store.is_revoked("jti-old"));
        assert!(!store.is_revoked("jti-2"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let store = InMemoryRevokedTokens::new();
        let now = Utc::now();
        store.revoke("live", now + Duration::minutes(5));
        store.revoke("dead", now - Duration::minutes(5));

        assert_eq!(store.purge_expired(now), 1);
        assert_eq!(store.len(), 1);
        assert!(store.is_revoked("live"));
        assert_eq!(store.purge_expired(now), 0);
    }
}
