//! Operational HTTP endpoints served next to the hub socket.
//!
//! `/healthz` answers as long as the process runs. `/readyz` flips to 503 once
//! shutdown starts so load balancers stop routing new sockets here.
//! `/metrics` exposes `HubMetrics` in Prometheus text format.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> Response {
    if state.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }
    let hubs = state.dispatcher().registered_hubs().join(",");
    (StatusCode::OK, format!("ready hubs={hubs}")).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render(&state.metrics_extra());
    ([(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response()
}
