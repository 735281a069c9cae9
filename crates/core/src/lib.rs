//! `authhub-core`: identity primitives shared by every authhub crate.
//!
//! This crate contains **pure** value types (no IO, no transport).

pub mod error;
pub mod id;

pub use error::CoreError;
pub use id::{normalize_target, OrganizationId, TenantId, TraceId, UserId};
