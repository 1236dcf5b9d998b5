//! Realtime websocket endpoint

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use skillswap_realtime::{Session, UserProfile};
use tracing::{debug, warn};

use crate::error::GatewayResult;
use crate::state::GatewayState;

pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/ws", get(websocket_handler))
}

/// Authenticate from the handshake cookie, then upgrade. A failed handshake
/// never reaches the connection manager.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    let cookies = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());

    let profile = state
        .authenticator
        .authenticate_cookie_header(cookies)
        .await
        .map_err(|err| {
            debug!(error = %err, "websocket handshake rejected");
            err
        })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, profile)))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, profile: UserProfile) {
    let (handle, mut events) = state.connections.admit(profile).await;
    let (mut sender, mut receiver) = socket.split();

    let connection = handle.id();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(event.as_ref()) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%connection, event = event.name(), error = %err, "failed to encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let session = Session::new(
        handle,
        state.connections.clone(),
        state.pipeline.clone(),
        state.session_options,
    );
    let session = Arc::new(session);
    let reader = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => reader.handle_text(&text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    debug!(%connection, error = %err, "websocket read failed");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    session.close().await;
}
