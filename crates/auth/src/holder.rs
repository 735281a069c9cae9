//! Request-scoped binding of the current [`IdentityContext`].
//!
//! The binding lives in a task-local slot that exists only while a request
//! scope is running. When the scope ends (the wrapped future completes,
//! errors, panics or is dropped) the slot is gone, so nothing can leak onto
//! the next request served by the same worker.

use std::cell::RefCell;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use authhub_core::{OrganizationId, TenantId, TraceId, UserId};

use crate::IdentityContext;
use crate::error::PreconditionViolation;

tokio::task_local! {
    static CURRENT: RefCell<Option<Arc<IdentityContext>>>;
}

static ANONYMOUS: LazyLock<Arc<IdentityContext>> =
    LazyLock::new(|| Arc::new(IdentityContext::anonymous()));

/// Access to the identity bound for the current request.
pub struct ContextHolder;

impl ContextHolder {
    /// Run `fut` with `context` bound for its whole lifetime.
    pub async fn scope<F>(context: impl Into<Arc<IdentityContext>>, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(RefCell::new(Some(context.into())), fut).await
    }

    /// Synchronous variant of [`ContextHolder::scope`].
    pub fn sync_scope<F, R>(context: impl Into<Arc<IdentityContext>>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT.sync_scope(RefCell::new(Some(context.into())), f)
    }

    /// Replace the binding of the active request scope.
    pub fn set_context(context: IdentityContext) -> Result<(), PreconditionViolation> {
        CURRENT
            .try_with(|slot| {
                *slot.borrow_mut() = Some(Arc::new(context));
            })
            .map_err(|_| PreconditionViolation::NoRequestScope)
    }

    /// The bound context, or the anonymous context when nothing is bound.
    pub fn context() -> Arc<IdentityContext> {
        CURRENT
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
            .unwrap_or_else(|| Arc::clone(&ANONYMOUS))
    }

    /// Unbind the context for the rest of the active scope. No-op outside a scope.
    pub fn clear_context() {
        let _ = CURRENT.try_with(|slot| slot.borrow_mut().take());
    }

    pub fn is_authenticated() -> bool {
        Self::context().is_authenticated()
    }

    pub fn current_user_id() -> Option<UserId> {
        Self::context().user_id().cloned()
    }

    pub fn current_tenant_id() -> Option<TenantId> {
        Self::context().tenant_id().cloned()
    }

    pub fn current_organization_id() -> Option<OrganizationId> {
        Self::context().organization_id().cloned()
    }

    pub fn current_trace_id() -> Option<TraceId> {
        Self::context().trace_id().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> IdentityContext {
        IdentityContext::builder()
            .user_id(UserId::new(id).unwrap())
            .tenant_id(TenantId::new("t1").unwrap())
            .role("USER")
            .build()
    }

    #[test]
    fn unbound_context_is_anonymous() {
        let ctx = ContextHolder::context();
        assert!(!ctx.is_authenticated());
        assert!(ctx.user_id().is_none());
    }

    #[test]
    fn set_context_outside_scope_is_rejected() {
        assert_eq!(
            ContextHolder::set_context(user("u1")),
            Err(PreconditionViolation::NoRequestScope)
        );
        assert!(!ContextHolder::is_authenticated());
    }

    #[test]
    fn sync_scope_binds_and_releases() {
        let seen = ContextHolder::sync_scope(user("u1"), ContextHolder::current_user_id);
        assert_eq!(seen.unwrap(), "u1");
        assert!(ContextHolder::current_user_id().is_none());
    }

    #[test]
    fn clear_context_resets_to_anonymous() {
        ContextHolder::sync_scope(user("u1"), || {
            assert!(ContextHolder::is_authenticated());
            ContextHolder::clear_context();
            let ctx = ContextHolder::context();
            assert!(!ctx.is_authenticated());
            assert_eq!(*ctx, IdentityContext::anonymous());
        });
    }

    #[test]
    fn set_context_replaces_binding_inside_scope() {
        ContextHolder::sync_scope(IdentityContext::anonymous(), || {
            ContextHolder::set_context(user("u2")).unwrap();
            assert_eq!(ContextHolder::current_user_id().unwrap(), "u2");
            assert_eq!(ContextHolder::current_tenant_id().unwrap(), "t1");
            assert!(ContextHolder::current_organization_id().is_none());
        });
    }

    #[test]
    fn panic_inside_scope_does_not_leak() {
        let result = std::panic::catch_unwind(|| {
            ContextHolder::sync_scope(user("u1"), || panic!("handler failed"))
        });
        assert!(result.is_err());
        assert!(ContextHolder::current_user_id().is_none());
    }

    #[tokio::test]
    async fn async_scope_survives_await_points() {
        let id = ContextHolder::scope(user("u1"), async {
            tokio::task::yield_now().await;
            ContextHolder::current_user_id()
        })
        .await;
        assert_eq!(id.unwrap(), "u1");
        assert!(ContextHolder::current_user_id().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_scopes_are_isolated() {
        let mut handles = Vec::new();
        for i in 0..16 {
            handles.push(tokio::spawn(ContextHolder::scope(user(&format!("u{i}")), async move {
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    let current = ContextHolder::current_user_id().unwrap();
                    assert_eq!(current.as_str(), format!("u{i}"));
                }
            })));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn dropped_scope_future_releases_binding() {
        let fut = ContextHolder::scope(user("u1"), std::future::pending::<()>());
        drop(fut);
        assert!(ContextHolder::current_user_id().is_none());
    }
}
