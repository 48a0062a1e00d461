//! Push-once WebSocket replay of recent messages.
//!
//! On connect the server sends the last [`RECENT_LIMIT`] messages as one JSON
//! text frame each, then [`REPLAY_DONE`], then closes. It never reads from
//! the client.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use tracing::{error, info, warn};

use crate::log::{MessageLog, RECENT_LIMIT};
use crate::message::Message;
use crate::trace::TraceId;

use super::AppState;

pub const REPLAY_DONE: &str = "All messages sent. Connection will close.";
pub const REPLAY_FAILED: &str = "Error reading messages";

pub async fn replay(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> Response {
    info!(trace_id = %trace, "websocket connection requested");
    let log = Arc::clone(&state.log);
    ws.on_upgrade(move |socket| replay_recent(socket, log, trace))
}

async fn replay_recent(mut socket: WebSocket, log: Arc<MessageLog>, trace: TraceId) {
    info!(trace_id = %trace, "websocket connection established");

    let frames = match log.last_n(RECENT_LIMIT, trace).await {
        Ok(messages) => replay_frames(&messages, trace),
        Err(err) => {
            error!(trace_id = %trace, error = %err, "failed to read messages");
            vec![REPLAY_FAILED.to_string()]
        }
    };

    let total = frames.len();
    for frame in frames {
        if let Err(err) = socket.send(WsMessage::Text(frame)).await {
            warn!(trace_id = %trace, error = %err, "failed to send frame");
            return;
        }
    }
    info!(trace_id = %trace, frames = total, "replay sent");

    if let Err(err) = socket.send(WsMessage::Close(None)).await {
        warn!(trace_id = %trace, error = %err, "failed to close websocket");
    }
}

/// Text frames for one replay: each message as JSON, then the sentinel.
pub fn replay_frames(messages: &[Message], trace: TraceId) -> Vec<String> {
    let mut frames: Vec<String> = messages
        .iter()
        .filter_map(|message| match serde_json::to_string(message) {
            Ok(json) => Some(json),
            Err(err) => {
                warn!(trace_id = %trace, message_id = message.id, error = %err, "failed to encode message");
                None
            }
        })
        .collect();
    frames.push(REPLAY_DONE.to_string());
    frames
}
