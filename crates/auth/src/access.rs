//! Composite role / permission / ownership predicates.
//!
//! Every predicate of [`AccessEvaluator`] returns `true` for a principal holding
//! `SUPER_ADMIN`, before any other argument is looked at. Resource predicates
//! combine an isolation check (same tenant, same organization, the user
//! themself) with the privilege that [`ActionPolicy`] requires for the action.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use authhub_core::normalize_target;

use crate::{ContextHolder, IdentityContext, PermissionKey};

/// Resource families guarded by action rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tenant,
    Organization,
    User,
    Role,
    Permission,
}

impl ResourceKind {
    /// Resource segment used in permission keys (`"role:read"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Tenant => "tenant",
            ResourceKind::Organization => "organization",
            ResourceKind::User => "user",
            ResourceKind::Role => "role",
            ResourceKind::Permission => "permission",
        }
    }
}

/// What an action on a resource requires beyond isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    /// Any authenticated principal.
    Authenticated,
    /// The owner of the resource (isolation check alone).
    Owner,
    /// The owner, holding the `"<resource>:<action>"` permission.
    Permission,
    /// `SUPER_ADMIN` only.
    SuperAdmin,
}

/// `(ResourceKind, action) → Privilege` table.
///
/// The default rules: owners may `read` and `update` tenants, organizations and
/// users; any authenticated principal may `read` permissions; role actions need
/// the matching `role:<action>` permission; everything else needs `SUPER_ADMIN`.
/// Explicit rules override the defaults.
#[derive(Debug, Clone, Default)]
pub struct ActionPolicy {
    rules: HashMap<ResourceKind, HashMap<String, Privilege>>,
}

static DEFAULT_POLICY: LazyLock<Arc<ActionPolicy>> = LazyLock::new(|| Arc::new(ActionPolicy::default()));

impl ActionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, kind: ResourceKind, action: impl Into<String>, privilege: Privilege) -> Self {
        self.rules.entry(kind).or_default().insert(action.into(), privilege);
        self
    }

    pub fn required(&self, kind: ResourceKind, action: &str) -> Privilege {
        self.rules
            .get(&kind)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or_else(|| default_privilege(kind, action))
    }
}

fn default_privilege(kind: ResourceKind, action: &str) -> Privilege {
    match (kind, action) {
        (ResourceKind::Tenant | ResourceKind::Organization | ResourceKind::User, "read" | "update") => {
            Privilege::Owner
        }
        (ResourceKind::Permission, "read") => Privilege::Authenticated,
        (ResourceKind::Role, _) => Privilege::Permission,
        _ => Privilege::SuperAdmin,
    }
}

/// Predicate surface over one principal's [`IdentityContext`].
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    context: Arc<IdentityContext>,
    policy: Arc<ActionPolicy>,
}

impl AccessEvaluator {
    pub fn new(context: Arc<IdentityContext>) -> Self {
        Self {
            context,
            policy: Arc::clone(&DEFAULT_POLICY),
        }
    }

    /// Evaluator over the context bound to the current request.
    pub fn current() -> Self {
        Self::new(ContextHolder::context())
    }

    pub fn with_policy(mut self, policy: Arc<ActionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &IdentityContext {
        &self.context
    }

    pub fn super_admin(&self) -> bool {
        self.context.is_super_admin()
    }

    pub fn authenticated(&self) -> bool {
        self.super_admin() || self.context.is_authenticated()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.super_admin() || self.context.has_role(role)
    }

    pub fn has_any_role<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.super_admin() || self.context.has_any_role(roles)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.super_admin() || self.context.has_permission(permission)
    }

    pub fn has_any_permission<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.super_admin() || self.context.has_any_permission(permissions)
    }

    pub fn has_all_permissions<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.super_admin() || self.context.has_all_permissions(permissions)
    }

    pub fn tenant_admin(&self) -> bool {
        self.super_admin() || self.context.is_tenant_admin()
    }

    pub fn org_admin(&self) -> bool {
        self.super_admin() || self.context.is_org_admin()
    }

    pub fn myself(&self, target_user_id: Option<&str>) -> bool {
        self.super_admin() || self.is_self(target_user_id)
    }

    pub fn myself_or(&self, target_user_id: Option<&str>, permission: &str) -> bool {
        self.myself(target_user_id) || self.has_permission(permission)
    }

    pub fn same_tenant(&self, target_tenant_id: Option<&str>) -> bool {
        self.super_admin() || matches_held(self.context.tenant_id().map(|t| t.as_str()), target_tenant_id)
    }

    pub fn same_organization(&self, target_org_id: Option<&str>) -> bool {
        self.super_admin()
            || matches_held(self.context.organization_id().map(|o| o.as_str()), target_org_id)
    }

    pub fn tenant(&self, target_tenant_id: Option<&str>, action: &str) -> bool {
        self.super_admin() || self.decide(ResourceKind::Tenant, action, self.same_tenant(target_tenant_id))
    }

    pub fn organization(&self, target_org_id: Option<&str>, action: &str) -> bool {
        self.super_admin()
            || self.decide(ResourceKind::Organization, action, self.same_organization(target_org_id))
    }

    pub fn user(&self, target_user_id: Option<&str>, action: &str) -> bool {
        self.super_admin() || self.decide(ResourceKind::User, action, self.is_self(target_user_id))
    }

    /// Role management. The role id does not narrow the decision.
    pub fn role(&self, _role_id: Option<&str>, action: &str) -> bool {
        self.super_admin() || self.decide(ResourceKind::Role, action, self.context.is_authenticated())
    }

    /// Permission management. The permission id does not narrow the decision.
    pub fn permission(&self, _permission_id: Option<&str>, action: &str) -> bool {
        self.super_admin()
            || self.decide(ResourceKind::Permission, action, self.context.is_authenticated())
    }

    /// Dispatch a resource predicate by kind.
    pub fn resource(&self, kind: ResourceKind, target_id: Option<&str>, action: &str) -> bool {
        match kind {
            ResourceKind::Tenant => self.tenant(target_id, action),
            ResourceKind::Organization => self.organization(target_id, action),
            ResourceKind::User => self.user(target_id, action),
            ResourceKind::Role => self.role(target_id, action),
            ResourceKind::Permission => self.permission(target_id, action),
        }
    }

    fn is_self(&self, target_user_id: Option<&str>) -> bool {
        matches_held(self.context.user_id().map(|u| u.as_str()), target_user_id)
    }

    fn decide(&self, kind: ResourceKind, action: &str, isolated: bool) -> bool {
        if !isolated {
            return false;
        }
        match self.policy.required(kind, action) {
            Privilege::Authenticated => self.context.is_authenticated(),
            Privilege::Owner => true,
            Privilege::Permission => self
                .context
                .has_permission(&PermissionKey::format(kind.as_str(), action)),
            Privilege::SuperAdmin => self.super_admin(),
        }
    }
}

fn matches_held(held: Option<&str>, target: Option<&str>) -> bool {
    matches!((held, normalize_target(target)), (Some(h), Some(t)) if h == t)
}
