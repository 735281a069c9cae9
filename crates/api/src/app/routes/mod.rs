pub mod endpoint_policies;
pub mod system;
