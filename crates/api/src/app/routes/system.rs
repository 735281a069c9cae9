use axum::{http::StatusCode, response::IntoResponse, Json};

use authhub_auth::{Guard, ScopeResolver};

use crate::authz::{self, AuthzRejection};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - the caller's resolved identity and scope.
pub async fn whoami() -> Result<impl IntoResponse, AuthzRejection> {
    let ev = authz::authorize(&Guard::Authenticated)?;
    let ctx = ev.context();
    let scope = ScopeResolver::current().current_scope();

    Ok(Json(serde_json::json!({
        "user_id": ctx.user_id(),
        "tenant_id": ctx.tenant_id(),
        "organization_id": ctx.organization_id(),
        "roles": ctx.roles(),
        "permissions": ctx.permissions(),
        "trace_id": ctx.trace_id(),
        "service_account": ctx.is_service_account(),
        "request_source": ctx.request_source(),
        "scope": scope,
    })))
}
