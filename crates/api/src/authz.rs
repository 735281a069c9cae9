//! Translation of authorization outcomes into HTTP responses.
//!
//! The engine answers with booleans; this module is where a `false` becomes
//! a 401 or 403. The body never says which check failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use authhub_auth::{AccessEvaluator, Guard};

use crate::app::errors::json_error;
use crate::context::InvalidServiceToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzRejection {
    Unauthenticated,
    Forbidden,
}

impl IntoResponse for AuthzRejection {
    fn into_response(self) -> Response {
        match self {
            AuthzRejection::Unauthenticated => {
                json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
            }
            AuthzRejection::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "access denied"),
        }
    }
}

impl IntoResponse for InvalidServiceToken {
    fn into_response(self) -> Response {
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "invalid service token")
    }
}

/// Evaluate `guard` against the identity bound to the current request.
pub fn authorize(guard: &Guard) -> Result<AccessEvaluator, AuthzRejection> {
    authorize_with(AccessEvaluator::current(), guard)
}

pub fn authorize_with(evaluator: AccessEvaluator, guard: &Guard) -> Result<AccessEvaluator, AuthzRejection> {
    if guard.evaluate(&evaluator) {
        Ok(evaluator)
    } else if evaluator.authenticated() {
        Err(AuthzRejection::Forbidden)
    } else {
        Err(AuthzRejection::Unauthenticated)
    }
}
