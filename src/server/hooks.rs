//! Lifecycle callbacks around a unit.
//!
//! # Call Order
//! ```text
//! serve:    before_serve()    → inner.serve()         → after_serve(result)
//! shutdown: before_shutdown() → inner.shutdown(d)     → after_shutdown(result)
//! ```
//!
//! Hooks run synchronously on the task that drives the wrapped call. They only
//! observe: the wrapped result is returned unchanged.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::time::Instant;
use tower::Layer;

use super::{Server, ServerError, ServerResult};

type Hook = Arc<dyn Fn() + Send + Sync>;
type ResultHook = Arc<dyn Fn(Option<&ServerError>) + Send + Sync>;

/// Optional callbacks invoked around `serve` and `shutdown`.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    before_serve: Option<Hook>,
    after_serve: Option<ResultHook>,
    before_shutdown: Option<Hook>,
    after_shutdown: Option<ResultHook>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called right before the wrapped `serve`.
    pub fn before_serve(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_serve = Some(Arc::new(hook));
        self
    }

    /// Called with the error (if any) returned by the wrapped `serve`.
    pub fn after_serve(mut self, hook: impl Fn(Option<&ServerError>) + Send + Sync + 'static) -> Self {
        self.after_serve = Some(Arc::new(hook));
        self
    }

    /// Called right before the wrapped `shutdown`.
    pub fn before_shutdown(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_shutdown = Some(Arc::new(hook));
        self
    }

    /// Called with the error (if any) returned by the wrapped `shutdown`.
    pub fn after_shutdown(mut self, hook: impl Fn(Option<&ServerError>) + Send + Sync + 'static) -> Self {
        self.after_shutdown = Some(Arc::new(hook));
        self
    }

    /// Wrap `server` with these hooks.
    pub fn wrap<S: Server>(self, server: S) -> Lifecycle<S> {
        Lifecycle { inner: server, hooks: self }
    }
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("before_serve", &self.before_serve.is_some())
            .field("after_serve", &self.after_serve.is_some())
            .field("before_shutdown", &self.before_shutdown.is_some())
            .field("after_shutdown", &self.after_shutdown.is_some())
            .finish()
    }
}

/// Tower layer that decorates units with [`LifecycleHooks`].
#[derive(Debug, Clone, Default)]
pub struct LifecycleLayer {
    hooks: LifecycleHooks,
}

impl LifecycleLayer {
    pub fn new(hooks: LifecycleHooks) -> Self {
        Self { hooks }
    }
}

impl<S> Layer<S> for LifecycleLayer {
    type Service = Lifecycle<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Lifecycle {
            inner,
            hooks: self.hooks.clone(),
        }
    }
}

/// A unit decorated with lifecycle hooks.
#[derive(Debug)]
pub struct Lifecycle<S> {
    inner: S,
    hooks: LifecycleHooks,
}

impl<S> Lifecycle<S> {
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Server for Lifecycle<S>
where
    S: Server,
{
    fn serve(&self) -> BoxFuture<'_, ServerResult> {
        Box::pin(async move {
            if let Some(hook) = &self.hooks.before_serve {
                hook();
            }
            let result = self.inner.serve().await;
            if let Some(hook) = &self.hooks.after_serve {
                hook(result.as_ref().err());
            }
            result
        })
    }

    fn shutdown(&self, deadline: Instant) -> BoxFuture<'_, ServerResult> {
        Box::pin(async move {
            if let Some(hook) = &self.hooks.before_shutdown {
                hook();
            }
            let result = self.inner.shutdown(deadline).await;
            if let Some(hook) = &self.hooks.after_shutdown {
                hook(result.as_ref().err());
            }
            result
        })
    }
}
