use std::collections::BTreeSet;

use serde::Serialize;

use authhub_core::{OrganizationId, TenantId, TraceId, UserId};

use crate::{ClaimSet, Permission, Role};

/// The principal of the current request.
///
/// Immutable once built. A context with no `user_id` is anonymous; every
/// other field is meaningless for an anonymous principal and is left empty.
/// A service account is a verified calling service; its `user_id`, when
/// present, is the end user the service forwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    user_id: Option<UserId>,
    tenant_id: Option<TenantId>,
    organization_id: Option<OrganizationId>,
    roles: BTreeSet<Role>,
    permissions: BTreeSet<Permission>,
    trace_id: Option<TraceId>,
    service_account: bool,
    request_source: Option<String>,
}

impl IdentityContext {
    pub fn builder() -> IdentityContextBuilder {
        IdentityContextBuilder::default()
    }

    /// The unauthenticated shape: every field null or empty.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    pub fn organization_id(&self) -> Option<&OrganizationId> {
        self.organization_id.as_ref()
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn is_service_account(&self) -> bool {
        self.service_account
    }

    /// Origin of the request: the calling service, or a client label such as `web`.
    pub fn request_source(&self) -> Option<&str> {
        self.request_source.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    pub fn has_any_role<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roles.into_iter().any(|r| self.has_role(r.as_ref()))
    }

    /// Exact or wildcard-segment match against the granted permissions.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.grants(permission))
    }

    pub fn has_any_permission<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions.into_iter().any(|p| self.has_permission(p.as_ref()))
    }

    /// True when every requested permission is granted (vacuously true for none).
    pub fn has_all_permissions<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions.into_iter().all(|p| self.has_permission(p.as_ref()))
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(Role::SUPER_ADMIN.as_str())
    }

    pub fn is_tenant_admin(&self) -> bool {
        self.has_role(Role::TENANT_ADMIN.as_str())
    }

    pub fn is_org_admin(&self) -> bool {
        self.has_role(Role::ORG_ADMIN.as_str())
    }
}

impl From<ClaimSet> for IdentityContext {
    fn from(claims: ClaimSet) -> Self {
        Self {
            user_id: Some(claims.user_id),
            tenant_id: claims.tenant_id,
            organization_id: claims.organization_id,
            roles: claims.roles,
            permissions: claims.permissions,
            trace_id: None,
            service_account: false,
            request_source: None,
        }
    }
}

/// Builder for populated contexts (gateway headers, tests, service principals).
#[derive(Debug, Default)]
pub struct IdentityContextBuilder {
    inner: IdentityContext,
}

impl IdentityContextBuilder {
    pub fn user_id(mut self, user_id: impl Into<Option<UserId>>) -> Self {
        self.inner.user_id = user_id.into();
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<Option<TenantId>>) -> Self {
        self.inner.tenant_id = tenant_id.into();
        self
    }

    pub fn organization_id(mut self, organization_id: impl Into<Option<OrganizationId>>) -> Self {
        self.inner.organization_id = organization_id.into();
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<Option<TraceId>>) -> Self {
        self.inner.trace_id = trace_id.into();
        self
    }

    pub fn request_source(mut self, source: impl Into<Option<String>>) -> Self {
        self.inner.request_source = source.into().filter(|s| !s.trim().is_empty());
        self
    }

    /// Mark the principal as the verified service `service_name`. The request
    /// source defaults to the service name.
    pub fn service_account(mut self, service_name: impl Into<String>) -> Self {
        self.inner.service_account = true;
        if self.inner.request_source.is_none() {
            self.inner.request_source = Some(service_name.into());
        }
        self
    }

    pub fn role(mut self, role: impl Into<Role>) -> Self {
        self.inner.roles.insert(role.into());
        self
    }

    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.inner.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn permission(mut self, permission: impl Into<Permission>) -> Self {
        self.inner.permissions.insert(permission.into());
        self
    }

    pub fn permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.inner.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> IdentityContext {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn tid(s: &str) -> TenantId {
        TenantId::new(s).unwrap()
    }

    #[test]
    fn builder_sets_every_field() {
        let ctx = IdentityContext::builder()
            .user_id(uid("u1"))
            .tenant_id(tid("t1"))
            .organization_id(OrganizationId::new("o1").unwrap())
            .roles(["TENANT_ADMIN", "USER"])
            .permissions(["user:read", "user:create"])
            .trace_id(TraceId::new("trace-1").unwrap())
            .build();

        assert_eq!(ctx.user_id().unwrap(), "u1");
        assert_eq!(ctx.tenant_id().unwrap(), "t1");
        assert_eq!(ctx.organization_id().unwrap(), "o1");
        assert_eq!(ctx.roles().len(), 2);
        assert_eq!(ctx.permissions().len(), 2);
        assert_eq!(ctx.trace_id().unwrap(), "trace-1");
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn anonymous_is_empty_and_unauthenticated() {
        let anon = IdentityContext::anonymous();
        assert!(!anon.is_authenticated());
        assert!(anon.user_id().is_none());
        assert!(anon.tenant_id().is_none());
        assert!(anon.organization_id().is_none());
        assert!(anon.roles().is_empty());
        assert!(anon.permissions().is_empty());
        assert!(anon.trace_id().is_none());
        assert!(!anon.is_service_account());
        assert!(anon.request_source().is_none());
    }

    #[test]
    fn service_account_defaults_source_to_service_name() {
        let svc = IdentityContext::builder().service_account("billing").build();
        assert!(svc.is_service_account());
        assert_eq!(svc.request_source(), Some("billing"));
        assert!(!svc.is_authenticated());

        let relayed = IdentityContext::builder()
            .user_id(uid("u1"))
            .request_source(Some("batch".to_string()))
            .service_account("billing")
            .build();
        assert!(relayed.is_authenticated());
        assert_eq!(relayed.request_source(), Some("batch"));
    }

    #[test]
    fn authenticated_tracks_user_id_only() {
        let ctx = IdentityContext::builder().tenant_id(tid("t1")).role("USER").build();
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn role_helpers() {
        let ctx = IdentityContext::builder().user_id(uid("u1")).roles(["TENANT_ADMIN"]).build();
        assert!(ctx.has_role("TENANT_ADMIN"));
        assert!(!ctx.has_role("SUPER_ADMIN"));
        assert!(ctx.has_any_role(["SUPER_ADMIN", "TENANT_ADMIN"]));
        assert!(!ctx.has_any_role(["SUPER_ADMIN", "ORG_ADMIN"]));
        assert!(ctx.is_tenant_admin());
        assert!(!ctx.is_super_admin());
        assert!(!ctx.is_org_admin());
    }

    #[test]
    fn permission_helpers() {
        let ctx = IdentityContext::builder()
            .user_id(uid("u1"))
            .permissions(["user:*", "order:write"])
            .build();

        assert!(ctx.has_permission("user:delete"));
        assert!(ctx.has_permission("order:write"));
        assert!(!ctx.has_permission("order:read"));
        assert!(ctx.has_any_permission(["order:read", "order:write"]));
        assert!(!ctx.has_any_permission(["tenant:read", "order:read"]));
        assert!(ctx.has_all_permissions(["user:read", "order:write"]));
        assert!(!ctx.has_all_permissions(["user:read", "tenant:read"]));
        assert!(ctx.has_all_permissions(Vec::<&str>::new()));
    }

    #[test]
    fn global_wildcard_grants_everything() {
        let ctx = IdentityContext::builder().user_id(uid("u1")).permission("*:*").build();
        assert!(ctx.has_permission("anything:any"));
    }

    #[test]
    fn equality_is_by_value() {
        let a = IdentityContext::builder().user_id(uid("u1")).roles(["USER"]).build();
        let b = IdentityContext::builder().user_id(uid("u1")).roles(["USER"]).build();
        let c = IdentityContext::builder().user_id(uid("u2")).roles(["USER"]).build();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
