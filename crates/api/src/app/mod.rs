//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use authhub_auth::{ServiceTokenVerifier, TokenClaimsExtractor};
use authhub_infra::EndpointPolicyStore;

use crate::middleware;

pub mod errors;
pub mod routes;

/// Shared handles for route handlers.
#[derive(Clone)]
pub struct AppServices {
    pub endpoint_policies: Arc<dyn EndpointPolicyStore>,
}

/// Build the router an embedding service mounts.
///
/// Every route runs inside the identity middleware, so handlers can consult
/// the bound context through the engine's checkers.
pub fn build_router(
    extractor: Arc<TokenClaimsExtractor>,
    services: Arc<dyn ServiceTokenVerifier>,
    endpoint_policies: Arc<dyn EndpointPolicyStore>,
) -> Router {
    let identity_state = middleware::IdentityState { extractor, services };
    let services = AppServices { endpoint_policies };

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/whoami", get(routes::system::whoami))
        .nest("/internal", routes::endpoint_policies::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    identity_state,
                    middleware::identity_middleware,
                ))
                .layer(Extension(services)),
        )
}
