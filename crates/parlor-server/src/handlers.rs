//! Connection handlers for the Parlor server.
//!
//! This module handles WebSocket admission (origin check, upgrade) and the
//! per-connection pump pair that bridges a socket to the room hub.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use parlor_core::{HubConfig, HubHandle, RoomHub};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Handle to the room hub.
    pub hub: HubHandle,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state, spawning the room hub.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let hub = RoomHub::spawn(HubConfig {
            outbox_capacity: config.limits.outbox_capacity,
            event_capacity: config.limits.event_queue_capacity,
        });

        Self { hub, config }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("Parlor server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Static index handler.
async fn index_handler() -> impl IntoResponse {
    "Parlor chat server"
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.hub.stats();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "participants": stats.participants,
        "delivered": stats.delivered,
        "dropped": stats.dropped,
    }))
}

/// Check whether the request's declared origin exactly matches the
/// configured trusted origin.
fn is_trusted_origin(headers: &HeaderMap, allowed: &str) -> bool {
    headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|origin| origin == allowed)
}

/// WebSocket upgrade handler.
///
/// Rejected upgrades never reach the hub.
async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    if !is_trusted_origin(&headers, &state.config.origin.allowed) {
        warn!("Rejecting upgrade from untrusted origin");
        metrics::record_error("origin");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state)))
}

/// Handle one WebSocket connection for its entire participant session.
///
/// Returns only when the participant has fully disconnected.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    let session = match state.hub.admit().await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Admission failed");
            return;
        }
    };
    let (identity, mut outbox) = session.into_parts();

    info!(participant = %identity.name, "Participant connected");
    metrics::set_participants(state.hub.stats().participants);

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    // Send pump: drains the outbound queue in FIFO order until the hub
    // closes it or a write fails. Dropping the sink half closes the
    // socket; the receive pump's own close is then a no-op.
    let pump_name = identity.name.clone();
    let send_pump = tokio::spawn(async move {
        while let Some(payload) = outbox.recv().await {
            // Envelope payloads are JSON, always valid UTF-8.
            let text = String::from_utf8_lossy(&payload).into_owned();
            metrics::record_message(text.len(), "outbound");
            if sender.send(Message::Text(text)).await.is_err() {
                debug!(participant = %pump_name, "Write failed, stopping send pump");
                break;
            }
        }
    });

    // Receive pump runs on this task until the connection ends. Forwarding
    // suspends while the hub is busy; that backpressure deliberately
    // throttles inbound reads.
    let max_message_size = state.config.limits.max_message_size;
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if text.len() > max_message_size {
                    warn!(
                        participant = %identity.name,
                        size = text.len(),
                        "Oversized message rejected"
                    );
                    metrics::record_error("oversized");
                    continue;
                }
                metrics::record_message(text.len(), "inbound");
                if state.hub.forward(identity.id, text).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                debug!(participant = %identity.name, "Ignoring binary frame");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Ping/pong is handled by the protocol layer.
            }
            Ok(Message::Close(_)) => {
                debug!(participant = %identity.name, "Received close frame");
                break;
            }
            Err(e) => {
                warn!(participant = %identity.name, error = %e, "WebSocket error");
                metrics::record_error("websocket");
                break;
            }
        }
    }

    // The leave event closes the outbound queue, letting the send pump
    // drain and exit before the socket is released.
    if state.hub.leave(identity.id).await.is_err() {
        send_pump.abort();
    }
    let _ = send_pump.await;

    metrics::set_participants(state.hub.stats().participants);
    metrics::set_dropped_deliveries(state.hub.stats().dropped);
    info!(participant = %identity.name, "Participant disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_trusted_origin_exact_match() {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        assert!(is_trusted_origin(&headers, "http://localhost:3000"));
    }

    #[test]
    fn test_untrusted_origin_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static("http://evil.example.com"));
        assert!(!is_trusted_origin(&headers, "http://localhost:3000"));

        // Prefix matches are not enough
        headers.insert(
            ORIGIN,
            HeaderValue::from_static("http://localhost:3000.evil.example.com"),
        );
        assert!(!is_trusted_origin(&headers, "http://localhost:3000"));
    }

    #[test]
    fn test_missing_origin_rejected() {
        let headers = HeaderMap::new();
        assert!(!is_trusted_origin(&headers, "http://localhost:3000"));
    }
}
