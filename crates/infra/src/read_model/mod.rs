//! Read models published to consumers outside the decision engine.

pub mod endpoint_policy_store;
pub mod revoked_tokens;

pub use endpoint_policy_store::{EndpointPolicyStore, InMemoryEndpointPolicyStore};
pub use revoked_tokens::InMemoryRevokedTokens;
