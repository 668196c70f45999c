//! HTTP adapter subsystem.
//!
//! # Data Flow
//! ```text
//! Group
//!     → server.rs (HttpServer: Router as a unit, graceful close on shutdown)
//!     → routes.rs (status routes + request ID, timeout, trace layers)
//! ```

pub mod routes;
pub mod server;

pub use routes::status_router;
pub use server::HttpServer;
