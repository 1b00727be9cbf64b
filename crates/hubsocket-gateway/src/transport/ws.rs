//! WebSocket upgrade handler.
//!
//! The HTTP upgrade itself is axum's; once upgraded the socket is split into
//! the connection's reader/writer halves and handed to the `Acceptor`.

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::transport::codec;

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }

    ws.on_upgrade(move |socket| async move {
        let (reader, writer) = codec::split(socket);
        if let Err(e) = app.acceptor().accept(reader, writer).await {
            tracing::error!(error = %e, code = e.client_code().as_str(), "connection teardown failed");
        }
    })
}
