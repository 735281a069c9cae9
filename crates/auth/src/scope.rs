use std::sync::Arc;

use serde::Serialize;

use authhub_core::normalize_target;

use crate::{ContextHolder, IdentityContext, Role};

/// Breadth of data a principal may reach. Ordered: `Organization < Tenant < Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Organization,
    Tenant,
    Global,
}

impl Scope {
    /// Highest scope granted by any of the roles; `Organization` when none apply.
    pub fn from_roles<'a, I>(roles: I) -> Self
    where
        I: IntoIterator<Item = &'a Role>,
    {
        roles
            .into_iter()
            .map(|role| match role.as_str() {
                "SUPER_ADMIN" => Scope::Global,
                "TENANT_ADMIN" => Scope::Tenant,
                _ => Scope::Organization,
            })
            .max()
            .unwrap_or(Scope::Organization)
    }

    /// Whether this scope covers `required` (`Global ⊇ Tenant ⊇ Organization`).
    pub fn includes(self, required: Scope) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Organization => "ORGANIZATION",
            Scope::Tenant => "TENANT",
            Scope::Global => "GLOBAL",
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers tenant / organization access questions for one principal.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    context: Arc<IdentityContext>,
}

impl ScopeResolver {
    pub fn new(context: Arc<IdentityContext>) -> Self {
        Self { context }
    }

    /// Resolver over the context bound to the current request.
    pub fn current() -> Self {
        Self::new(ContextHolder::context())
    }

    pub fn current_scope(&self) -> Scope {
        Scope::from_roles(self.context.roles())
    }

    pub fn can_access_tenant(&self, target_tenant_id: Option<&str>) -> bool {
        let Some(target) = normalize_target(target_tenant_id) else {
            return false;
        };
        match self.current_scope() {
            Scope::Global => true,
            Scope::Tenant | Scope::Organization => {
                self.context.tenant_id().is_some_and(|held| held == target)
            }
        }
    }

    /// Organization access. Tenant scope checks the tenant only and ignores the
    /// organization id; organization scope checks the organization only.
    pub fn can_access_organization(
        &self,
        target_org_id: Option<&str>,
        target_tenant_id: Option<&str>,
    ) -> bool {
        let Some(target_org) = normalize_target(target_org_id) else {
            return false;
        };
        match self.current_scope() {
            Scope::Global => true,
            Scope::Tenant => held_equals(self.context.tenant_id().map(|t| t.as_str()), target_tenant_id),
            Scope::Organization => self
                .context
                .organization_id()
                .is_some_and(|held| held == target_org),
        }
    }

    pub fn can_access_global(&self) -> bool {
        self.current_scope() == Scope::Global
    }

    /// Access to another user's record, located by that user's tenant and organization.
    pub fn can_access_user(
        &self,
        target_user_id: Option<&str>,
        target_tenant_id: Option<&str>,
        target_org_id: Option<&str>,
    ) -> bool {
        let Some(target_user) = normalize_target(target_user_id) else {
            return false;
        };
        if self.context.user_id().is_some_and(|held| held == target_user) {
            return true;
        }
        match self.current_scope() {
            Scope::Global => true,
            Scope::Tenant => held_equals(self.context.tenant_id().map(|t| t.as_str()), target_tenant_id),
            Scope::Organization => {
                held_equals(self.context.organization_id().map(|o| o.as_str()), target_org_id)
            }
        }
    }

    pub fn has_sufficient_scope(&self, required: Scope) -> bool {
        self.current_scope().includes(required)
    }

    pub fn tenant(&self, target_tenant_id: Option<&str>) -> bool {
        self.can_access_tenant(target_tenant_id)
    }

    pub fn organization(&self, target_org_id: Option<&str>, target_tenant_id: Option<&str>) -> bool {
        self.can_access_organization(target_org_id, target_tenant_id)
    }

    pub fn global(&self) -> bool {
        self.can_access_global()
    }

    pub fn own_tenant(&self, target_tenant_id: Option<&str>) -> bool {
        self.can_access_tenant(target_tenant_id)
    }

    /// Organization access within the principal's own tenant.
    pub fn own_organization(&self, target_org_id: Option<&str>) -> bool {
        let held_tenant = self.context.tenant_id().map(|t| t.as_str());
        self.can_access_organization(target_org_id, held_tenant)
    }
}

fn held_equals(held: Option<&str>, target: Option<&str>) -> bool {
    matches!((held, normalize_target(target)), (Some(h), Some(t)) if h == t)
}
