//! WebSocket handler for real-time updates
//!
//! Streams [`StreamResponse`] chunks collected off the bus's stream-output
//! topic to connected clients, plus keep-alive and error events.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use qa_core_bus::StreamConsumer;
use qa_core_utils::StreamResponse;

use crate::api::routes::AppState;

/// WebSocket event types forwarded to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    /// Connection established
    #[serde(rename = "connected")]
    Connected { client_id: String },

    /// A partial or final chunk of agent/stream output.
    #[serde(rename = "stream_chunk")]
    StreamChunk {
        source: String,
        content: String,
        is_final: bool,
        result: Option<serde_json::Value>,
    },

    /// Error event
    #[serde(rename = "error")]
    Error { message: String },

    /// Keep-alive ping
    #[serde(rename = "ping")]
    Ping,

    /// Keep-alive pong response
    #[serde(rename = "pong")]
    Pong,
}

impl From<StreamResponse> for WsEvent {
    fn from(resp: StreamResponse) -> Self {
        WsEvent::StreamChunk {
            source: resp.source,
            content: resp.content,
            is_final: resp.is_final,
            result: resp.result,
        }
    }
}

/// WebSocket broadcast state, fed by the stream collector and drained by
/// every connected client's own relay task.
#[derive(Clone)]
pub struct BroadcastState {
    pub tx: broadcast::Sender<WsEvent>,
}

impl BroadcastState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { tx }
    }

    pub async fn broadcast(&self, event: WsEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for BroadcastState {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts [`BroadcastState`] to [`StreamConsumer`] so it can be handed
/// straight to `Factory::spawn_stream_collector`.
pub struct BroadcastConsumer(pub std::sync::Arc<BroadcastState>);

#[async_trait]
impl StreamConsumer for BroadcastConsumer {
    async fn consume(&self, response: StreamResponse) {
        self.0.broadcast(WsEvent::from(response)).await;
    }
}

/// GET /ws — upgrades to a WebSocket and relays every broadcast event to
/// the client until it disconnects or sends a close frame.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let client_id = qa_core_utils::new_id();
    let connected = serde_json::to_string(&WsEvent::Connected {
        client_id: client_id.clone(),
    })
    .unwrap_or_default();
    if socket.send(Message::Text(connected)).await.is_err() {
        return;
    }

    let mut rx = state.broadcast.tx.subscribe();
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let Ok(text) = serde_json::to_string(&event) else { continue };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_event_serialization() {
        let event = WsEvent::Ping;
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ping"));
    }

    #[test]
    fn test_stream_chunk_from_stream_response() {
        let resp = StreamResponse::final_text("executor", "done");
        let event: WsEvent = resp.into();
        match event {
            WsEvent::StreamChunk { is_final, content, .. } => {
                assert!(is_final);
                assert_eq!(content, "done");
            }
            _ => panic!("expected StreamChunk"),
        }
    }

    #[tokio::test]
    async fn test_broadcast_state_creation() {
        let state = BroadcastState::new();
        assert_eq!(state.tx.receiver_count(), 0);
    }
}
