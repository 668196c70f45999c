//! Server group coordinator.
//!
//! # Protocol
//! ```text
//! Starting     → spawn serve() for every unit, completions go to one channel
//! Racing       → first completion  vs  external interrupt
//! ShuttingDown → shutdown(deadline) on every unit, input order, one deadline
//! Draining     → collect the remaining serve() completions as they arrive
//! Done         → [serve errors] ++ [shutdown errors]
//! ```
//!
//! # Design Decisions
//! - The completion channel holds one slot per unit so no unit task waits to report
//! - `shutdown` runs sequentially on the caller's task; every unit is stopped,
//!   including the one whose `serve` already returned
//! - The deadline is an absolute instant shared by all `shutdown` calls
//! - No forced termination: a unit ignoring its deadline is still awaited
//! - Unit tasks live in a `JoinSet`; dropping the group future aborts them
//! - Panics in unit code are caught and reported as errors

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ShutdownConfig;
use crate::lifecycle::signals::{self, Signal};
use crate::observability::metrics;
use crate::server::{Server, ServerError, ServerResult};

/// Default shutdown budget shared by all units.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline offset used when the configured budget overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Phase of the unit call that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Serve,
    Shutdown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Serve => "serve",
            Phase::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by one unit, tagged with its position and phase.
#[derive(Debug, Error)]
pub enum GroupError {
    /// The unit's `serve` failed.
    #[error("server {index} failed while serving: {source}")]
    Serve {
        index: usize,
        #[source]
        source: ServerError,
    },

    /// The unit's `shutdown` failed.
    #[error("server {index} failed to shut down: {source}")]
    Shutdown {
        index: usize,
        #[source]
        source: ServerError,
    },
}

impl GroupError {
    /// Position of the unit in the list passed to the group.
    pub fn index(&self) -> usize {
        match self {
            GroupError::Serve { index, .. } | GroupError::Shutdown { index, .. } => *index,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            GroupError::Serve { .. } => Phase::Serve,
            GroupError::Shutdown { .. } => Phase::Shutdown,
        }
    }

    /// The error returned by the unit.
    pub fn server_error(&self) -> &ServerError {
        match self {
            GroupError::Serve { source, .. } | GroupError::Shutdown { source, .. } => source,
        }
    }

    pub fn into_server_error(self) -> ServerError {
        match self {
            GroupError::Serve { source, .. } | GroupError::Shutdown { source, .. } => source,
        }
    }
}

/// What ended the race between the units and the interrupt.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    ServerStopped(usize),
    Interrupted,
}

/// Runs a set of servers together and tears them down together.
#[derive(Debug, Clone)]
pub struct Group {
    signals: Vec<Signal>,
    timeout: Duration,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            signals: signals::default_signals(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Group {
    /// Create a group with the default signals and timeout.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ShutdownConfig) -> Self {
        Self {
            signals: config.signals.clone(),
            timeout: config.timeout(),
        }
    }

    /// Replace the signal kinds treated as an external interrupt.
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Replace the shutdown budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run all servers until one stops or a configured signal arrives.
    ///
    /// Returns every error raised while serving or shutting down, serve
    /// errors first. An empty list means a fully clean run.
    pub async fn run<I>(&self, servers: I) -> Vec<GroupError>
    where
        I: IntoIterator<Item = Arc<dyn Server>>,
    {
        self.run_until(servers, signals::wait_for_any(&self.signals)).await
    }

    /// Like [`run`](Self::run), with `interrupt` as the external trigger.
    pub async fn run_until<I, F>(&self, servers: I, interrupt: F) -> Vec<GroupError>
    where
        I: IntoIterator<Item = Arc<dyn Server>>,
        F: Future<Output = ()>,
    {
        let servers: Vec<Arc<dyn Server>> = servers.into_iter().collect();
        if servers.is_empty() {
            tracing::debug!("No servers to run");
            return Vec::new();
        }

        let span = tracing::info_span!("server_group", run_id = %Uuid::new_v4(), servers = servers.len());
        self.coordinate(servers, interrupt).instrument(span).await
    }

    async fn coordinate<F>(&self, servers: Vec<Arc<dyn Server>>, interrupt: F) -> Vec<GroupError>
    where
        F: Future<Output = ()>,
    {
        metrics::record_run_started();
        tracing::info!(timeout = ?self.timeout, "Starting server group");

        let (done_tx, mut done_rx) = mpsc::channel::<(usize, ServerResult)>(servers.len());
        let mut tasks = JoinSet::new();
        for (index, server) in servers.iter().enumerate() {
            let server = Arc::clone(server);
            let done_tx = done_tx.clone();
            tasks.spawn(
                async move {
                    metrics::record_server_started();
                    let result = guarded(server.serve()).await;
                    metrics::record_server_stopped();
                    // One slot per unit: this never waits. A closed receiver
                    // means the caller dropped the group future.
                    let _ = done_tx.send((index, result)).await;
                }
                .in_current_span(),
            );
        }
        drop(done_tx);

        let mut pending = servers.len();
        let mut serve_errors = Vec::new();

        let trigger = {
            let interrupt = std::pin::pin!(interrupt);
            tokio::select! {
                Some((index, result)) = done_rx.recv() => {
                    pending -= 1;
                    if let Err(e) = result {
                        tracing::warn!(index, error = %e, "Server failed while serving");
                        serve_errors.push(GroupError::Serve { index, source: e });
                    }
                    Trigger::ServerStopped(index)
                }
                () = interrupt => Trigger::Interrupted,
            }
        };

        match trigger {
            Trigger::ServerStopped(index) => tracing::info!(index, "Server stopped, shutting down group"),
            Trigger::Interrupted => tracing::info!("Interrupted, shutting down group"),
        }
        metrics::record_trigger(match trigger {
            Trigger::ServerStopped(_) => "server",
            Trigger::Interrupted => "interrupt",
        });

        let started = Instant::now();
        let deadline = shutdown_deadline(started, self.timeout);
        let mut shutdown_errors = Vec::new();
        for (index, server) in servers.iter().enumerate() {
            if let Err(e) = guarded(server.shutdown(deadline)).await {
                tracing::warn!(index, error = %e, "Server failed to shut down");
                shutdown_errors.push(GroupError::Shutdown { index, source: e });
            }
        }
        metrics::record_shutdown_duration(started.elapsed());

        while pending > 0 {
            let Some((index, result)) = done_rx.recv().await else {
                break;
            };
            pending -= 1;
            match result {
                Ok(()) => tracing::debug!(index, "Server drained"),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Server failed while serving");
                    serve_errors.push(GroupError::Serve { index, source: e });
                }
            }
        }

        let mut errors = serve_errors;
        errors.append(&mut shutdown_errors);
        for error in &errors {
            metrics::record_error(error.phase().as_str());
        }

        // Every unit has reported; only task exits remain.
        tasks.detach_all();

        tracing::info!(errors = errors.len(), "Server group stopped");
        errors
    }
}

/// Run `servers` with the default signals and timeout.
pub async fn run<I>(servers: I) -> Vec<GroupError>
where
    I: IntoIterator<Item = Arc<dyn Server>>,
{
    Group::default().run(servers).await
}

/// `started + timeout`, saturating to a far-future instant on overflow.
fn shutdown_deadline(started: Instant, timeout: Duration) -> Instant {
    started
        .checked_add(timeout)
        .unwrap_or_else(|| started + FAR_FUTURE)
}

/// Drive a unit call, turning a panic into an error.
async fn guarded<F>(call: F) -> ServerResult
where
    F: Future<Output = ServerResult>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(ServerError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
