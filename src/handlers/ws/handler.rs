//! Axum WebSocket handlers for the calibration channels
//!
//! Both `/ws` and `/ws/calibration` share one connection loop; the
//! [`SessionProfile`] decides the handshake and the accepted commands.

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::{
    messages::{IncomingMessage, MessageRoute, OutgoingMessage},
    processor::{CALIBRATION_GREETING, handle_incoming_message, handle_invalid_message},
    state::{ConnectionState, SessionProfile},
};

/// Outgoing queue depth per connection
pub(crate) const CHANNEL_BUFFER_SIZE: usize = 256;

/// How long queued messages may take to flush after the session ends
pub(crate) const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Primary calibration channel
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state, SessionProfile::Primary))
}

/// Unauthenticated calibration-only channel
pub async fn ws_calibration_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Calibration WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state, SessionProfile::Calibration))
}

/// Spawn the task that owns the socket's write half.
///
/// Messages are written in queue order; a [`MessageRoute::Close`] is sent
/// after everything queued before it and ends the task.
pub(crate) fn spawn_sender_task<M>(
    mut sender: SplitSink<WebSocket, Message>,
    mut message_rx: mpsc::Receiver<MessageRoute<M>>,
) -> JoinHandle<()>
where
    M: Serialize + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                MessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MessageRoute::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    let _ = sender.send(Message::Close(Some(frame))).await;
                    break;
                }
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    })
}

/// Wait for queued messages to be written, then stop the sender
pub(crate) async fn finish_sender_task<M>(
    message_tx: mpsc::Sender<MessageRoute<M>>,
    mut sender_task: JoinHandle<()>,
) {
    drop(message_tx);
    if tokio::time::timeout(FLUSH_TIMEOUT, &mut sender_task)
        .await
        .is_err()
    {
        warn!("Timed out flushing WebSocket messages");
        sender_task.abort();
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, profile: SessionProfile) {
    let (sender, mut receiver) = socket.split();

    let calibration = app_state.core_state.calibration.context_for_session();
    let mut state = ConnectionState::new(profile, calibration, app_state.config.frame_interval());

    info!(
        session_id = %state.session_id,
        profile = profile.name(),
        scope = ?app_state.core_state.calibration.scope(),
        "WebSocket connection established"
    );

    let (message_tx, message_rx) = mpsc::channel::<MessageRoute<OutgoingMessage>>(CHANNEL_BUFFER_SIZE);
    let sender_task = spawn_sender_task(sender, message_rx);

    if profile == SessionProfile::Calibration {
        let _ = message_tx
            .send(MessageRoute::Outgoing(OutgoingMessage::message(
                CALIBRATION_GREETING,
            )))
            .await;
    }

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(msg) => {
                if !process_message(msg, &mut state, &message_tx, &app_state).await {
                    break;
                }
            }
            Err(e) => {
                warn!(session_id = %state.session_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    finish_sender_task(message_tx, sender_task).await;

    info!(session_id = %state.session_id, "WebSocket connection terminated");
}

/// Process one WebSocket frame. Returns false when the connection should close.
async fn process_message(
    msg: Message,
    state: &mut ConnectionState,
    message_tx: &mpsc::Sender<MessageRoute<OutgoingMessage>>,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        Message::Text(text) => match IncomingMessage::parse(&text) {
            Ok(incoming) => handle_incoming_message(incoming, state, message_tx, app_state).await,
            Err(e) => {
                debug!(session_id = %state.session_id, "Failed to parse message: {}", e);
                handle_invalid_message(state, message_tx, app_state).await
            }
        },
        Message::Binary(_) => {
            debug!(session_id = %state.session_id, "Binary frames are not supported");
            handle_invalid_message(state, message_tx, app_state).await
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!(session_id = %state.session_id, "WebSocket connection closed by client");
            false
        }
    }
}
