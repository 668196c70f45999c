//! Shared helpers for group integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use server_group::{Server, ServerError, ServerResult, Shutdown};
use tokio::time::Instant;

/// Ordered record of calls made across all test servers.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A scriptable server.
///
/// By default `serve` blocks until `shutdown` is called. With a serve delay it
/// returns after the delay instead, ignoring `shutdown`.
pub struct TestServer {
    label: String,
    log: EventLog,
    serve_error: Option<String>,
    shutdown_error: Option<String>,
    serve_delay: Option<Duration>,
    stop: Shutdown,
    serve_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
    deadlines: Mutex<Vec<Instant>>,
}

impl TestServer {
    pub fn new(label: impl Into<String>, log: &EventLog) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
            serve_error: None,
            shutdown_error: None,
            serve_delay: None,
            stop: Shutdown::new(),
            serve_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
            deadlines: Mutex::new(Vec::new()),
        }
    }

    pub fn serve_error(mut self, message: &str) -> Self {
        self.serve_error = Some(message.to_string());
        self
    }

    pub fn shutdown_error(mut self, message: &str) -> Self {
        self.shutdown_error = Some(message.to_string());
        self
    }

    /// Return from `serve` after `delay`, whether or not shutdown was requested.
    pub fn serve_for(mut self, delay: Duration) -> Self {
        self.serve_delay = Some(delay);
        self
    }

    pub fn serve_calls(&self) -> usize {
        self.serve_calls.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }

    pub fn deadlines(&self) -> Vec<Instant> {
        self.deadlines.lock().unwrap().clone()
    }
}

fn outcome(error: &Option<String>) -> ServerResult {
    match error {
        Some(message) => Err(ServerError::msg(message.clone())),
        None => Ok(()),
    }
}

impl Server for TestServer {
    fn serve(&self) -> BoxFuture<'_, ServerResult> {
        Box::pin(async move {
            self.serve_calls.fetch_add(1, Ordering::SeqCst);
            self.log.push(format!("serve {}", self.label));
            match self.serve_delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => self.stop.wait().await,
            }
            self.log.push(format!("served {}", self.label));
            outcome(&self.serve_error)
        })
    }

    fn shutdown(&self, deadline: Instant) -> BoxFuture<'_, ServerResult> {
        Box::pin(async move {
            self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
            self.deadlines.lock().unwrap().push(deadline);
            self.log.push(format!("shutdown {}", self.label));
            self.stop.trigger();
            outcome(&self.shutdown_error)
        })
    }
}

/// Upcast concrete servers for `Group::run`.
pub fn servers<S: Server + 'static>(servers: &[Arc<S>]) -> Vec<Arc<dyn Server>> {
    servers.iter().map(|s| s.clone() as Arc<dyn Server>).collect()
}

/// Error messages of a group result, in order.
pub fn messages(errors: &[server_group::GroupError]) -> Vec<String> {
    errors.iter().map(|e| e.server_error().to_string()).collect()
}
