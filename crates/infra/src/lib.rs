//! Infrastructure layer: storage adapters for authorization read models.

pub mod read_model;

pub use read_model::{EndpointPolicyStore, InMemoryEndpointPolicyStore, InMemoryRevokedTokens};
