//! Endpoint policy read API for gateways.
//!
//! The response carries the list version in `x-policy-version`. A consumer
//! that sends the version it holds in `If-None-Match` gets `304` while the
//! list is unchanged.

use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::app::AppServices;
use crate::context::header_str;

pub const POLICY_VERSION_HEADER: &str = "x-policy-version";

pub fn router() -> Router {
    Router::new().route("/endpoint-policies/:service_name", get(list_for_service))
}

/// GET /internal/endpoint-policies/:service_name
pub async fn list_for_service(
    Extension(services): Extension<AppServices>,
    Path(service_name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let list = services.endpoint_policies.list_for_service(&service_name);
    let version = HeaderValue::from_str(&list.version).ok();

    let cached = header_str(&headers, header::IF_NONE_MATCH.as_str())
        .is_some_and(|held| held.trim().trim_matches('"') == list.version);

    let mut response = if cached {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        Json(list).into_response()
    };
    if let Some(version) = version {
        response.headers_mut().insert(POLICY_VERSION_HEADER, version);
    }
    response
}
