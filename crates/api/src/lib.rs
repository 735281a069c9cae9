//! HTTP adapter: request identity binding, 401/403 translation, and the
//! endpoint policy read API.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;

pub use app::build_router;
