use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use authhub_auth::{ContextHolder, HttpMethod, IdentityContext, ServiceTokenVerifier, TokenClaimsExtractor};
use authhub_infra::EndpointPolicyStore;
use authhub_observability::{correlation_id, request_span, TRACE_ID_HEADER};

use crate::authz::AuthzRejection;
use crate::context::{header_str, resolve_identity, IdentitySource};

#[derive(Clone)]
pub struct IdentityState {
    pub extractor: Arc<TokenClaimsExtractor>,
    pub services: Arc<dyn ServiceTokenVerifier>,
}

/// Resolve the caller's identity and bind it for the rest of the request.
///
/// The binding is released when the downstream future completes, fails or is
/// dropped. The identity is also inserted into request extensions as
/// `Arc<IdentityContext>`, and the correlation id is echoed on the response.
/// A presented service token that does not verify ends the request with 401.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    req: Request,
    next: Next,
) -> Response {
    let trace_id = correlation_id(header_str(req.headers(), TRACE_ID_HEADER));
    let span = request_span(req.method().as_str(), req.uri().path(), &trace_id);

    let resolved = resolve_identity(
        req.headers(),
        &state.extractor,
        state.services.as_ref(),
        trace_id.clone(),
    );
    let mut response = match resolved {
        Ok((identity, source)) => bind_and_run(identity, source, span, req, next).await,
        Err(rejected) => {
            span.in_scope(|| tracing::warn!("service token rejected"));
            rejected.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    }
    response
}

async fn bind_and_run(
    identity: IdentityContext,
    source: IdentitySource,
    span: tracing::Span,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(user_id) = identity.user_id() {
        span.record("user_id", user_id.as_str());
    }
    span.in_scope(|| tracing::debug!(source = source.as_str(), "request identity resolved"));

    let identity = Arc::new(identity);
    req.extensions_mut().insert(Arc::clone(&identity));

    ContextHolder::scope(identity, next.run(req))
        .instrument(span)
        .await
}

#[derive(Clone)]
pub struct EndpointPolicyState {
    pub store: Arc<dyn EndpointPolicyStore>,
    pub service_name: String,
}

/// Enforce the published endpoint policies of `service_name`.
///
/// Must run inside [`identity_middleware`]. Unlisted paths and unknown
/// methods are denied.
pub async fn endpoint_policy_middleware(
    State(state): State<EndpointPolicyState>,
    req: Request,
    next: Next,
) -> Response {
    let context = ContextHolder::context();
    let list = state.store.list_for_service(&state.service_name);

    let permitted = match req.method().as_str().parse::<HttpMethod>() {
        Ok(method) => list.resolve(method, req.uri().path()).permits(&context),
        Err(_) => false,
    };

    if permitted {
        next.run(req).await
    } else {
        tracing::debug!(path = req.uri().path(), "denied by endpoint policy");
        deny(&context).into_response()
    }
}

fn deny(context: &IdentityContext) -> AuthzRejection {
    if context.is_authenticated() {
        AuthzRejection::Forbidden
    } else {
        AuthzRejection::Unauthenticated
    }
}
