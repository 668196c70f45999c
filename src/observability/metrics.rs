//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_group_runs_total` (counter): group invocations with at least one server
//! - `server_group_triggers_total` (counter): what ended the race, by `trigger`
//! - `server_group_errors_total` (counter): returned errors, by `phase`
//! - `server_group_active_servers` (gauge): `serve` calls currently running
//! - `server_group_shutdown_duration_seconds` (histogram): time spent in `shutdown` calls

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_run_started() {
    counter!("server_group_runs_total").increment(1);
}

pub fn record_trigger(trigger: &'static str) {
    counter!("server_group_triggers_total", "trigger" => trigger).increment(1);
}

pub fn record_error(phase: &'static str) {
    counter!("server_group_errors_total", "phase" => phase).increment(1);
}

pub fn record_server_started() {
    gauge!("server_group_active_servers").increment(1.0);
}

pub fn record_server_stopped() {
    gauge!("server_group_active_servers").decrement(1.0);
}

pub fn record_shutdown_duration(elapsed: Duration) {
    histogram!("server_group_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}
