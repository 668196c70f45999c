//! OS signal handling.
//!
//! # Responsibilities
//! - Name the signal kinds a group treats as an external interrupt
//! - Register listeners for those kinds and resolve on the first delivery
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Listeners are created when the wait is first polled and dropped with it
//! - Tokio keeps its process-wide handler for a kind once registered: after a
//!   group invocation returns, those signals are still caught (and ignored)
//!   instead of getting the OS default action
//! - The kind that fired is logged but not reported to the caller

use std::fmt;
use std::str::FromStr;

use futures_util::future;
use serde::{Deserialize, Serialize};

/// Signal kinds that can interrupt a running group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// SIGINT (Ctrl+C).
    #[serde(alias = "sigint")]
    Interrupt,
    /// SIGTERM.
    #[serde(alias = "sigterm")]
    Terminate,
    /// SIGHUP.
    #[serde(alias = "sighup")]
    Hangup,
    /// SIGQUIT.
    #[serde(alias = "sigquit")]
    Quit,
    /// SIGUSR1.
    #[serde(alias = "sigusr1")]
    User1,
    /// SIGUSR2.
    #[serde(alias = "sigusr2")]
    User2,
}

/// Signals used when none are configured.
pub fn default_signals() -> Vec<Signal> {
    vec![Signal::Interrupt, Signal::Terminate]
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "interrupt",
            Signal::Terminate => "terminate",
            Signal::Hangup => "hangup",
            Signal::Quit => "quit",
            Signal::User1 => "user1",
            Signal::User2 => "user2",
        }
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown signal name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal: {0}")]
pub struct UnknownSignal(String);

impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interrupt" | "int" | "sigint" => Ok(Signal::Interrupt),
            "terminate" | "term" | "sigterm" => Ok(Signal::Terminate),
            "hangup" | "hup" | "sighup" => Ok(Signal::Hangup),
            "quit" | "sigquit" => Ok(Signal::Quit),
            "user1" | "usr1" | "sigusr1" => Ok(Signal::User1),
            "user2" | "usr2" | "sigusr2" => Ok(Signal::User2),
            _ => Err(UnknownSignal(s.to_string())),
        }
    }
}

/// Resolve when any of `signals` is delivered to the process.
///
/// Never resolves when `signals` is empty or none of them could be registered.
#[cfg(unix)]
pub async fn wait_for_any(signals: &[Signal]) {
    use tokio::signal::unix;

    let mut listeners = Vec::with_capacity(signals.len());
    for &signal in signals {
        match unix::signal(signal.kind()) {
            Ok(listener) => listeners.push((signal, listener)),
            Err(e) => tracing::warn!(signal = %signal, error = %e, "Failed to register signal handler"),
        }
    }

    if listeners.is_empty() {
        return future::pending().await;
    }

    let waits = listeners.iter_mut().map(|(signal, listener)| {
        Box::pin(async move {
            if listener.recv().await.is_none() {
                future::pending::<()>().await;
            }
            *signal
        })
    });

    let (signal, _, _) = future::select_all(waits).await;
    tracing::info!(signal = %signal, "Interrupt signal received");
}

/// Resolve when any of `signals` is delivered to the process.
///
/// Only `Interrupt` (Ctrl+C) is available on this platform.
#[cfg(not(unix))]
pub async fn wait_for_any(signals: &[Signal]) {
    if signals.contains(&Signal::Interrupt) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!(signal = %Signal::Interrupt, "Interrupt signal received");
                return;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to register Ctrl+C handler"),
        }
    }
    future::pending().await
}
