use serde::{Deserialize, Serialize};

use crate::{AccessEvaluator, ResourceKind};

/// Typed guard expression, evaluated against an [`AccessEvaluator`].
///
/// Leaves map one-to-one onto evaluator predicates; `All`, `Any` and `Not`
/// compose them. `All(vec![])` is `true`, `Any(vec![])` is `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Guard {
    Authenticated,
    SuperAdmin,
    TenantAdmin,
    OrgAdmin,
    HasRole { role: String },
    HasAnyRole { roles: Vec<String> },
    HasPermission { permission: String },
    HasAnyPermission { permissions: Vec<String> },
    HasAllPermissions { permissions: Vec<String> },
    Myself { user_id: Option<String> },
    MyselfOr { user_id: Option<String>, permission: String },
    SameTenant { tenant_id: Option<String> },
    SameOrganization { organization_id: Option<String> },
    Resource {
        resource: ResourceKind,
        id: Option<String>,
        action: String,
    },
    All { guards: Vec<Guard> },
    Any { guards: Vec<Guard> },
    Not { guard: Box<Guard> },
}

impl Guard {
    pub fn role(role: impl Into<String>) -> Self {
        Guard::HasRole { role: role.into() }
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Guard::HasPermission {
            permission: permission.into(),
        }
    }

    pub fn resource(resource: ResourceKind, id: Option<&str>, action: impl Into<String>) -> Self {
        Guard::Resource {
            resource,
            id: id.map(str::to_string),
            action: action.into(),
        }
    }

    pub fn all(guards: impl IntoIterator<Item = Guard>) -> Self {
        Guard::All {
            guards: guards.into_iter().collect(),
        }
    }

    pub fn any(guards: impl IntoIterator<Item = Guard>) -> Self {
        Guard::Any {
            guards: guards.into_iter().collect(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(guard: Guard) -> Self {
        Guard::Not { guard: Box::new(guard) }
    }

    pub fn evaluate(&self, ev: &AccessEvaluator) -> bool {
        match self {
            Guard::Authenticated => ev.authenticated(),
            Guard::SuperAdmin => ev.super_admin(),
            Guard::TenantAdmin => ev.tenant_admin(),
            Guard::OrgAdmin => ev.org_admin(),
            Guard::HasRole { role } => ev.has_role(role),
            Guard::HasAnyRole { roles } => ev.has_any_role(roles),
            Guard::HasPermission { permission } => ev.has_permission(permission),
            Guard::HasAnyPermission { permissions } => ev.has_any_permission(permissions),
            Guard::HasAllPermissions { permissions } => ev.has_all_permissions(permissions),
            Guard::Myself { user_id } => ev.myself(user_id.as_deref()),
            Guard::MyselfOr { user_id, permission } => ev.myself_or(user_id.as_deref(), permission),
            Guard::SameTenant { tenant_id } => ev.same_tenant(tenant_id.as_deref()),
            Guard::SameOrganization { organization_id } => {
                ev.same_organization(organization_id.as_deref())
            }
            Guard::Resource { resource, id, action } => ev.resource(*resource, id.as_deref(), action),
            Guard::All { guards } => guards.iter().all(|g| g.evaluate(ev)),
            Guard::Any { guards } => guards.iter().any(|g| g.evaluate(ev)),
            Guard::Not { guard } => !guard.evaluate(ev),
        }
    }
}
