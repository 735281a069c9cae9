//! Request identity resolution.
//!
//! Identity comes from, in order: a service token (when `X-Service-Token` is
//! present), trusted gateway headers (when `X-User-Id` is present), a bearer
//! token verified by the [`TokenClaimsExtractor`], or the anonymous context.
//! Only a presented but unverifiable service token is an error.

use axum::http::{header, HeaderMap};
use thiserror::Error;

use authhub_auth::{IdentityContext, Permission, Role, ServiceTokenVerifier, TokenClaimsExtractor};
use authhub_core::{OrganizationId, TenantId, TraceId, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";
pub const ROLES_HEADER: &str = "x-user-roles";
pub const PERMISSIONS_HEADER: &str = "x-permissions";
pub const REQUEST_SOURCE_HEADER: &str = "x-request-source";

pub const SERVICE_NAME_HEADER: &str = "x-service-name";
pub const SERVICE_TOKEN_HEADER: &str = "x-service-token";
pub const ORIGINAL_USER_ID_HEADER: &str = "x-original-user-id";
pub const ORIGINAL_TENANT_ID_HEADER: &str = "x-original-tenant-id";
pub const ORIGINAL_ORGANIZATION_ID_HEADER: &str = "x-original-organization-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid service token")]
pub struct InvalidServiceToken;

/// Where a request's identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Service,
    Gateway,
    Bearer,
    Anonymous,
}

impl IdentitySource {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentitySource::Service => "service",
            IdentitySource::Gateway => "gateway",
            IdentitySource::Bearer => "bearer",
            IdentitySource::Anonymous => "anonymous",
        }
    }
}

/// Build the identity for one request.
///
/// Fails only when a service token is presented and does not verify; an
/// unusable bearer token or gateway header yields anonymous instead.
pub fn resolve_identity(
    headers: &HeaderMap,
    extractor: &TokenClaimsExtractor,
    services: &dyn ServiceTokenVerifier,
    trace_id: TraceId,
) -> Result<(IdentityContext, IdentitySource), InvalidServiceToken> {
    let request_source = header_str(headers, REQUEST_SOURCE_HEADER).map(str::to_string);

    if let Some(token) = non_blank(header_str(headers, SERVICE_TOKEN_HEADER)) {
        let service_name = non_blank(header_str(headers, SERVICE_NAME_HEADER)).ok_or(InvalidServiceToken)?;
        if !services.verify(service_name, token) {
            return Err(InvalidServiceToken);
        }
        let ctx = IdentityContext::builder()
            .user_id(UserId::parse_optional(header_str(headers, ORIGINAL_USER_ID_HEADER)))
            .tenant_id(TenantId::parse_optional(header_str(headers, ORIGINAL_TENANT_ID_HEADER)))
            .organization_id(OrganizationId::parse_optional(header_str(
                headers,
                ORIGINAL_ORGANIZATION_ID_HEADER,
            )))
            .request_source(request_source)
            .service_account(service_name.trim())
            .trace_id(trace_id)
            .build();
        return Ok((ctx, IdentitySource::Service));
    }

    if let Some(user_id) = UserId::parse_optional(header_str(headers, USER_ID_HEADER)) {
        let ctx = IdentityContext::builder()
            .user_id(user_id)
            .tenant_id(TenantId::parse_optional(header_str(headers, TENANT_ID_HEADER)))
            .organization_id(OrganizationId::parse_optional(header_str(
                headers,
                ORGANIZATION_ID_HEADER,
            )))
            .roles(split_list(header_str(headers, ROLES_HEADER)).filter_map(Role::parse))
            .permissions(split_list(header_str(headers, PERMISSIONS_HEADER)).filter_map(Permission::parse))
            .request_source(request_source)
            .trace_id(trace_id)
            .build();
        return Ok((ctx, IdentitySource::Gateway));
    }

    if let Some(claims) = extractor.extract_claims(bearer_token(headers)) {
        let ctx = IdentityContext::builder()
            .user_id(claims.user_id)
            .tenant_id(claims.tenant_id)
            .organization_id(claims.organization_id)
            .roles(claims.roles)
            .permissions(claims.permissions)
            .request_source(request_source)
            .trace_id(trace_id)
            .build();
        return Ok((ctx, IdentitySource::Bearer));
    }

    let ctx = IdentityContext::builder().trace_id(trace_id).build();
    Ok((ctx, IdentitySource::Anonymous))
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Token of an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header_str(headers, header::AUTHORIZATION.as_str())?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.into_iter()
        .flat_map(|r| r.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
