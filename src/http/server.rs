//! HTTP server adapter.
//!
//! # Responsibilities
//! - Expose an Axum router as a group unit (`serve` / `shutdown`)
//! - Bind lazily or take a pre-bound listener
//! - Map a graceful close to `Ok(())` and bound the close by the deadline
//!
//! # Design Decisions
//! - `shutdown` before `serve` started, or after it returned, is a no-op
//! - In-flight requests may outlive the deadline; `serve` keeps draining them
//!   and the group waits for it

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tokio::time::Instant;

use crate::lifecycle::Shutdown;
use crate::server::{Server, ServerError, ServerResult};

/// Where the server gets its listener from.
enum Binding {
    Address(SocketAddr),
    Listener(TcpListener),
}

/// An Axum router run as a group unit.
pub struct HttpServer {
    name: String,
    router: Router,
    binding: Mutex<Option<Binding>>,
    started: AtomicBool,
    /// Asks `serve` to close gracefully.
    stop: Shutdown,
    /// Set once `serve` has returned.
    stopped: Shutdown,
}

impl HttpServer {
    /// Create a server that binds `address` when served.
    pub fn new(name: impl Into<String>, address: SocketAddr, router: Router) -> Self {
        Self::with_binding(name.into(), Binding::Address(address), router)
    }

    /// Create a server on an already bound listener.
    pub fn from_listener(name: impl Into<String>, listener: TcpListener, router: Router) -> Self {
        Self::with_binding(name.into(), Binding::Listener(listener), router)
    }

    fn with_binding(name: String, binding: Binding, router: Router) -> Self {
        Self {
            name,
            router,
            binding: Mutex::new(Some(binding)),
            started: AtomicBool::new(false),
            stop: Shutdown::new(),
            stopped: Shutdown::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn take_binding(&self) -> Option<Binding> {
        match self.binding.lock() {
            Ok(mut binding) => binding.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    async fn listen(&self) -> Result<TcpListener, ServerError> {
        match self.take_binding() {
            Some(Binding::Listener(listener)) => Ok(listener),
            Some(Binding::Address(address)) => {
                TcpListener::bind(address)
                    .await
                    .map_err(|source| ServerError::Bind {
                        address: address.to_string(),
                        source,
                    })
            }
            None => Err(ServerError::AlreadyStarted),
        }
    }

    async fn run(&self) -> ServerResult {
        let listener = self.listen().await?;
        let address = listener.local_addr()?;
        tracing::info!(server = %self.name, address = %address, "HTTP server listening");

        let stop = self.stop.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { stop.wait().await })
            .await?;

        tracing::info!(server = %self.name, "HTTP server stopped");
        Ok(())
    }
}

/// Marks the server stopped when `serve` returns, on every path.
struct StoppedGuard<'a>(&'a Shutdown);

impl Drop for StoppedGuard<'_> {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

impl Server for HttpServer {
    fn serve(&self) -> BoxFuture<'_, ServerResult> {
        Box::pin(async move {
            if self.started.swap(true, Ordering::SeqCst) {
                return Err(ServerError::AlreadyStarted);
            }
            let _stopped = StoppedGuard(&self.stopped);
            self.run().await
        })
    }

    fn shutdown(&self, deadline: Instant) -> BoxFuture<'_, ServerResult> {
        Box::pin(async move {
            self.stop.trigger();
            if !self.started.load(Ordering::SeqCst) {
                return Ok(());
            }

            match tokio::time::timeout_at(deadline, self.stopped.wait()).await {
                Ok(()) => Ok(()),
                Err(_) => {
                    tracing::warn!(server = %self.name, "HTTP server did not stop before the deadline");
                    Err(ServerError::DeadlineExceeded)
                }
            }
        })
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("name", &self.name)
            .field("started", &self.started.load(Ordering::SeqCst))
            .field("stopped", &self.stopped.is_triggered())
            .finish_non_exhaustive()
    }
}
