use std::sync::Arc;

use authhub_api::middleware::{
    endpoint_policy_middleware, identity_middleware, EndpointPolicyState, IdentityState,
};
use authhub_auth::{
    ContextHolder, EndpointPolicyList, EndpointPolicySpec, HttpMethod, JwtValidationConfig,
    StaticServiceTokens, TokenClaims, TokenClaimsExtractor, UrlPattern,
};
use authhub_infra::{EndpointPolicyStore, InMemoryEndpointPolicyStore, InMemoryRevokedTokens};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

fn extractor() -> Arc<TokenClaimsExtractor> {
    Arc::new(TokenClaimsExtractor::new(&JwtValidationConfig::hmac(SECRET, "authhub")).unwrap())
}

fn services() -> Arc<StaticServiceTokens> {
    Arc::new(StaticServiceTokens::new().with("billing", "svc-secret"))
}

fn app(store: Arc<InMemoryEndpointPolicyStore>) -> Router {
    authhub_api::build_router(extractor(), services(), store)
}

fn mint_jwt(roles: &[&str]) -> String {
    mint_jwt_with_id(roles, None)
}

fn mint_jwt_with_id(roles: &[&str], jti: Option<&str>) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: "u1".to_string(),
        iss: "authhub".to_string(),
        exp: (now + ChronoDuration::minutes(10)).timestamp() as u64,
        iat: Some(now.timestamp() as u64),
        jti: jti.map(str::to_string),
        tid: Some("t1".to_string()),
        oid: Some("o1".to_string()),
        roles: Some(roles.iter().map(|r| r.to_string()).collect()),
        permissions: Some(vec!["user:read".to_string()]),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_req(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

#[tokio::test]
async fn correlation_id_is_echoed_or_generated() {
    let store = Arc::new(InMemoryEndpointPolicyStore::new());

    let res = app(store.clone())
        .oneshot(get_req("/health").header("x-trace-id", "trace-abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-trace-id"], "trace-abc");

    let res = app(store)
        .oneshot(get_req("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.headers()["x-trace-id"].len(), 36);
}

#[tokio::test]
async fn anonymous_whoami_is_unauthenticated() {
    let res = app(Arc::new(InMemoryEndpointPolicyStore::new()))
        .oneshot(get_req("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn rejected_token_reads_like_no_token() {
    let res = app(Arc::new(InMemoryEndpointPolicyStore::new()))
        .oneshot(
            get_req("/whoami")
                .header("authorization", "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["message"], "authentication required");
}

#[tokio::test]
async fn bearer_identity_is_bound_for_the_request() {
    let res = app(Arc::new(InMemoryEndpointPolicyStore::new()))
        .oneshot(
            get_req("/whoami")
                .header("authorization", format!("Bearer {}", mint_jwt(&["TENANT_ADMIN", "USER"])))
                .header("x-trace-id", "trace-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["tenant_id"], "t1");
    assert_eq!(body["organization_id"], "o1");
    assert_eq!(body["scope"], "TENANT");
    assert_eq!(body["trace_id"], "trace-1");
    assert_eq!(body["roles"], serde_json::json!(["TENANT_ADMIN", "USER"]));

    assert!(!ContextHolder::is_authenticated());
}

#[tokio::test]
async fn revoked_token_is_unauthenticated() {
    let revoked = Arc::new(InMemoryRevokedTokens::new());
    revoked.revoke("session-1", Utc::now() + ChronoDuration::minutes(10));
    let extractor = Arc::new((*extractor()).clone().with_revocation(revoked));
    let app = authhub_api::build_router(extractor, services(), Arc::new(InMemoryEndpointPolicyStore::new()));

    let res = app
        .clone()
        .oneshot(
            get_req("/whoami")
                .header("authorization", format!("Bearer {}", mint_jwt_with_id(&["USER"], Some("session-1"))))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            get_req("/whoami")
                .header("authorization", format!("Bearer {}", mint_jwt_with_id(&["USER"], Some("session-2"))))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn service_token_binds_service_account() {
    let res = app(Arc::new(InMemoryEndpointPolicyStore::new()))
        .oneshot(
            get_req("/whoami")
                .header("x-service-name", "billing")
                .header("x-service-token", "svc-secret")
                .header("x-original-user-id", "user-123")
                .header("x-original-tenant-id", "tenant-456")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["user_id"], "user-123");
    assert_eq!(body["tenant_id"], "tenant-456");
    assert_eq!(body["service_account"], true);
    assert_eq!(body["request_source"], "billing");
}

#[tokio::test]
async fn invalid_service_token_is_rejected() {
    let res = app(Arc::new(InMemoryEndpointPolicyStore::new()))
        .oneshot(
            get_req("/health")
                .header("x-service-name", "billing")
                .header("x-service-token", "wrong")
                .header("x-trace-id", "trace-svc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["x-trace-id"], "trace-svc");
    let body = body_json(res).await;
    assert_eq!(body["message"], "invalid service token");
}

#[tokio::test]
async fn gateway_headers_take_precedence() {
    let res = app(Arc::new(InMemoryEndpointPolicyStore::new()))
        .oneshot(
            get_req("/whoami")
                .header("x-user-id", "gw-user")
                .header("x-user-roles", "ROLE_SUPER_ADMIN")
                .header("authorization", format!("Bearer {}", mint_jwt(&["USER"])))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["user_id"], "gw-user");
    assert_eq!(body["scope"], "GLOBAL");
    assert!(body["tenant_id"].is_null());
}

#[tokio::test]
async fn endpoint_policy_read_api_is_versioned() {
    let store = Arc::new(InMemoryEndpointPolicyStore::new());

    let res = app(store.clone())
        .oneshot(get_req("/internal/endpoint-policies/user-service").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let empty: EndpointPolicyList = serde_json::from_value(body_json(res).await).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.version, EndpointPolicyList::EPOCH_VERSION);

    let version = store.upsert(
        EndpointPolicySpec::new(HttpMethod::Get, UrlPattern::new("/api/users/{id}").unwrap(), "user-service")
            .unwrap()
            .with_permissions(["user:read"]),
    );

    let res = app(store.clone())
        .oneshot(get_req("/internal/endpoint-policies/user-service").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.headers()["x-policy-version"], version.as_str());
    let list: EndpointPolicyList = serde_json::from_value(body_json(res).await).unwrap();
    assert_eq!(list.version, version);
    assert_eq!(list.endpoints.len(), 1);
    assert_eq!(list.endpoints[0].path_pattern.as_str(), "/api/users/{id}");

    let res = app(store)
        .oneshot(
            get_req("/internal/endpoint-policies/user-service")
                .header("if-none-match", format!("\"{version}\""))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
}

fn guarded_service(store: Arc<InMemoryEndpointPolicyStore>) -> Router {
    let policy_state = EndpointPolicyState {
        store,
        service_name: "user-service".to_string(),
    };

    Router::new()
        .route("/api/ping", get(|| async { "pong" }))
        .route(
            "/api/users/:id",
            get(|| async { ContextHolder::current_user_id().map(|u| u.to_string()).unwrap_or_default() }),
        )
        .route("/api/unlisted", get(|| async { "should not be reachable" }))
        .layer(axum::middleware::from_fn_with_state(policy_state, endpoint_policy_middleware))
        .layer(axum::middleware::from_fn_with_state(
            IdentityState {
                extractor: extractor(),
                services: services(),
            },
            identity_middleware,
        ))
}

#[tokio::test]
async fn endpoint_policies_gate_downstream_routes() {
    let store = Arc::new(InMemoryEndpointPolicyStore::new());
    store.upsert(
        EndpointPolicySpec::new(HttpMethod::Get, UrlPattern::new("/api/ping").unwrap(), "user-service")
            .unwrap()
            .public(),
    );
    store.upsert(
        EndpointPolicySpec::new(HttpMethod::Get, UrlPattern::new("/api/users/{id}").unwrap(), "user-service")
            .unwrap()
            .with_permissions(["user:read"]),
    );

    let res = guarded_service(store.clone())
        .oneshot(get_req("/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = guarded_service(store.clone())
        .oneshot(get_req("/api/users/42").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = guarded_service(store.clone())
        .oneshot(
            get_req("/api/users/42")
                .header("x-user-id", "u9")
                .header("x-permissions", "user:*")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"u9");

    let res = guarded_service(store)
        .oneshot(
            get_req("/api/unlisted")
                .header("x-user-id", "u9")
                .header("x-user-roles", "SUPER_ADMIN")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
