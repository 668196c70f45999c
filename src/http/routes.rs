//! Default routes served by the `server-group` binary.

use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Router answering `GET /` with the server name and `GET /health` with `ok`.
pub fn status_router(name: &str, request_timeout: Duration) -> Router {
    let name = name.to_string();
    Router::new()
        .route(
            "/",
            get(move || {
                let name = name.clone();
                async move { name }
            }),
        )
        .route("/health", get(|| async { "ok" }))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
