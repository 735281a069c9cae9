use std::sync::Arc;

use authhub_core::{normalize_target, TenantId, UserId};

use crate::{ContextHolder, IdentityContext};

/// Derives the tenant restriction a query must apply for the principal.
#[derive(Debug, Clone)]
pub struct TenantFilterResolver {
    context: Arc<IdentityContext>,
}

impl TenantFilterResolver {
    pub fn new(context: Arc<IdentityContext>) -> Self {
        Self { context }
    }

    pub fn current() -> Self {
        Self::new(ContextHolder::context())
    }

    pub fn can_access(&self, tenant_id: Option<&str>) -> bool {
        if self.context.is_super_admin() {
            return true;
        }
        match (self.context.tenant_id(), normalize_target(tenant_id)) {
            (Some(held), Some(target)) => held == target,
            _ => false,
        }
    }

    /// Tenant the caller must filter on. `None` for `SUPER_ADMIN` means "do not filter".
    pub fn filter_tenant_id(&self) -> Option<TenantId> {
        if self.context.is_super_admin() {
            None
        } else {
            self.context.tenant_id().cloned()
        }
    }

    pub fn is_tenant_bound(&self) -> bool {
        !self.context.is_super_admin() && self.context.is_authenticated()
    }

    pub fn current_tenant_id(&self) -> Option<TenantId> {
        self.context.tenant_id().cloned()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.context.user_id().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(role: &'static str, tenant: Option<&str>) -> TenantFilterResolver {
        let ctx = IdentityContext::builder()
            .user_id(UserId::new("u1").unwrap())
            .tenant_id(tenant.map(|t| TenantId::new(t).unwrap()))
            .role(role)
            .build();
        TenantFilterResolver::new(Arc::new(ctx))
    }

    #[test]
    fn tenant_admin_can_access_own_tenant_only() {
        let r = resolver("TENANT_ADMIN", Some("100"));
        assert!(r.can_access(Some("100")));
        assert!(!r.can_access(Some("200")));
        assert!(!r.can_access(None));
        assert!(!r.can_access(Some("  ")));
        assert!(r.can_access(Some(" 100 ")));
    }

    #[test]
    fn super_admin_is_unrestricted() {
        let r = resolver("SUPER_ADMIN", None);
        assert!(r.can_access(Some("200")));
        assert_eq!(r.filter_tenant_id(), None);
        assert!(!r.is_tenant_bound());
    }

    #[test]
    fn regular_user_filters_on_held_tenant() {
        let r = resolver("USER", Some("100"));
        assert_eq!(r.filter_tenant_id().unwrap(), "100");
        assert!(r.is_tenant_bound());
        assert_eq!(r.current_tenant_id().unwrap(), "100");
        assert_eq!(r.current_user_id().unwrap(), "u1");
    }

    #[test]
    fn anonymous_is_not_tenant_bound() {
        let r = TenantFilterResolver::new(Arc::new(IdentityContext::anonymous()));
        assert!(!r.is_tenant_bound());
        assert_eq!(r.filter_tenant_id(), None);
        assert!(!r.can_access(Some("100")));
    }

    #[test]
    fn current_reads_bound_context() {
        let ctx = IdentityContext::builder()
            .user_id(UserId::new("u7").unwrap())
            .tenant_id(TenantId::new("t7").unwrap())
            .build();
        let filter = ContextHolder::sync_scope(ctx, || TenantFilterResolver::current().filter_tenant_id());
        assert_eq!(filter.unwrap(), "t7");
    }
}
