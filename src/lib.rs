//! Run a fixed set of servers together and tear them down together.
//!
//! A [`Group`] starts every [`Server`] concurrently, waits until the first one
//! stops or an interrupt signal arrives, shuts every server down under one
//! shared deadline and returns every error raised along the way.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod server;

pub use config::GroupConfig;
pub use http::HttpServer;
pub use lifecycle::{run, Group, GroupError, Phase, Shutdown, Signal};
pub use server::{from_fn, FnServer, Lifecycle, LifecycleHooks, LifecycleLayer, Server, ServerError, ServerResult};
