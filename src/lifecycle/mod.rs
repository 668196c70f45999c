//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Group::run (group.rs):
//!     spawn every Server::serve → race first stop vs interrupt
//!     → shutdown all, input order, shared deadline → drain → Vec<GroupError>
//!
//! Interrupts:
//!     signals.rs   SIGINT/SIGTERM/... → resolves the race
//!     shutdown.rs  Shutdown::trigger() → resolves the race (run_until)
//! ```
//!
//! # Design Decisions
//! - All units are always shut down together; no restarts, no partial teardown
//! - Shutdown has a timeout: one absolute deadline for the whole teardown
//! - Every error from every phase is returned, none is logged-and-dropped

pub mod group;
pub mod shutdown;
pub mod signals;

pub use group::{run, Group, GroupError, Phase, DEFAULT_TIMEOUT};
pub use shutdown::Shutdown;
pub use signals::{default_signals, Signal};
