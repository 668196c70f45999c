//! Server unit contract.
//!
//! # Data Flow
//! ```text
//! Group (lifecycle/group.rs)
//!     → Server::serve()            one task per unit, runs until stopped or failed
//!     → Server::shutdown(deadline) sequential, shared absolute deadline
//!
//! Decorators (hooks.rs):
//!     LifecycleLayer → Lifecycle<S> → S
//! ```
//!
//! # Design Decisions
//! - Units are trait objects; behaviour is composed by wrapping, not inheritance
//! - `shutdown` must be safe after `serve` has returned (idempotent close)
//! - A unit has no identity beyond its position in the list given to the group

pub mod hooks;

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::time::Instant;

pub use hooks::{Lifecycle, LifecycleHooks, LifecycleLayer};

/// Errors reported by a unit's `serve` or `shutdown`.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The unit could not bind its listening address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `serve` was called on a unit that already started.
    #[error("server already started")]
    AlreadyStarted,

    /// Termination could not be confirmed before the shutdown deadline.
    #[error("shutdown deadline exceeded")]
    DeadlineExceeded,

    /// The unit panicked while serving or shutting down.
    #[error("server panicked: {0}")]
    Panicked(String),

    /// Free-form failure.
    #[error("{0}")]
    Message(String),

    /// Any other error raised by a unit.
    #[error(transparent)]
    Other(Box<dyn StdError + Send + Sync>),
}

impl ServerError {
    /// Create a free-form error.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap an arbitrary error.
    pub fn other<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Other(Box::new(error))
    }
}

/// Result of a single unit call.
pub type ServerResult = Result<(), ServerError>;

/// A service unit whose lifecycle is managed by a [`Group`](crate::lifecycle::Group).
pub trait Server: Send + Sync {
    /// Run until the unit stops on its own or fails.
    fn serve(&self) -> BoxFuture<'_, ServerResult>;

    /// Request graceful termination, bounded by `deadline`.
    ///
    /// Must return `Ok(())` when `serve` has already returned successfully.
    fn shutdown(&self, deadline: Instant) -> BoxFuture<'_, ServerResult>;
}

impl<S> Server for Arc<S>
where
    S: Server + ?Sized,
{
    fn serve(&self) -> BoxFuture<'_, ServerResult> {
        (**self).serve()
    }

    fn shutdown(&self, deadline: Instant) -> BoxFuture<'_, ServerResult> {
        (**self).shutdown(deadline)
    }
}

/// A unit built from a pair of closures.
pub struct FnServer<S, D> {
    serve: S,
    shutdown: D,
}

/// Build a unit from a `serve` closure and a `shutdown` closure.
///
/// ```ignore
/// let server = server_group::from_fn(
///     || async { Ok(()) },
///     |_deadline| async { Ok(()) },
/// );
/// ```
pub fn from_fn<S, SF, D, DF>(serve: S, shutdown: D) -> FnServer<S, D>
where
    S: Fn() -> SF + Send + Sync,
    SF: Future<Output = ServerResult> + Send + 'static,
    D: Fn(Instant) -> DF + Send + Sync,
    DF: Future<Output = ServerResult> + Send + 'static,
{
    FnServer { serve, shutdown }
}

impl<S, SF, D, DF> Server for FnServer<S, D>
where
    S: Fn() -> SF + Send + Sync,
    SF: Future<Output = ServerResult> + Send + 'static,
    D: Fn(Instant) -> DF + Send + Sync,
    DF: Future<Output = ServerResult> + Send + 'static,
{
    fn serve(&self) -> BoxFuture<'_, ServerResult> {
        (self.serve)().boxed()
    }

    fn shutdown(&self, deadline: Instant) -> BoxFuture<'_, ServerResult> {
        (self.shutdown)(deadline).boxed()
    }
}

impl<S, D> std::fmt::Debug for FnServer<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnServer").finish_non_exhaustive()
    }
}
