//! Voice channel connection handling

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::Auth;
use crate::core::voice::{Command, VoiceSession};
use crate::handlers::ws::handler::{CHANNEL_BUFFER_SIZE, finish_sender_task, spawn_sender_task};
use crate::handlers::ws::{MessageRoute, SessionError, SessionResult};
use crate::state::AppState;

use super::messages::{VoiceIncoming, VoiceOutgoing};

type Sender = mpsc::Sender<MessageRoute<VoiceOutgoing>>;

#[derive(Debug, Default, Deserialize)]
pub struct VoiceQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Per-connection voice state, discarded on disconnect
pub struct VoiceConnection {
    pub session_id: String,
    pub auth: Auth,
    pub authenticated: bool,
    pub voice: VoiceSession,
}

impl VoiceConnection {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            auth: Auth::empty(),
            authenticated: false,
            voice: VoiceSession::new(),
        }
    }
}

impl Default for VoiceConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Voice command channel. The token may come from `?token=` or the first message.
pub async fn ws_voice_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<VoiceQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Voice WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_voice_socket(socket, state, query.token))
}

async fn handle_voice_socket(socket: WebSocket, app_state: Arc<AppState>, token: Option<String>) {
    let (sender, mut receiver) = socket.split();
    let mut state = VoiceConnection::new();

    info!(session_id = %state.session_id, "Voice WebSocket connection established");

    let (message_tx, message_rx) = mpsc::channel::<MessageRoute<VoiceOutgoing>>(CHANNEL_BUFFER_SIZE);
    let sender_task = spawn_sender_task(sender, message_rx);

    let keep_open = open_session(token, &mut state, &message_tx, &app_state).await;

    if keep_open {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(session_id = %state.session_id, "Voice WebSocket error: {}", e);
                    break;
                }
            };

            let keep_going = match msg {
                Message::Text(text) => {
                    handle_voice_text(&text, &mut state, &message_tx, &app_state).await
                }
                Message::Binary(_) => {
                    debug!(session_id = %state.session_id, "Ignoring binary frame on voice channel");
                    true
                }
                Message::Ping(_) | Message::Pong(_) => true,
                Message::Close(_) => {
                    info!(session_id = %state.session_id, "Voice WebSocket closed by client");
                    false
                }
            };

            if !keep_going {
                break;
            }
        }
    }

    finish_sender_task(message_tx, sender_task).await;
    info!(session_id = %state.session_id, "Voice WebSocket connection terminated");
}

/// Authenticate from the query token, or skip when auth is disabled.
///
/// Returns false when the session was rejected.
pub async fn open_session(
    token: Option<String>,
    state: &mut VoiceConnection,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> bool {
    if !app_state.verifier.required() {
        state.authenticated = true;
        send(message_tx, VoiceOutgoing::authenticated(state.auth.display_name())).await;
        return true;
    }

    match token {
        Some(token) => authenticate(&token, state, message_tx, app_state).await,
        // Wait for the first message to carry the token
        None => true,
    }
}

/// Handle one text frame. Returns false when the session must end.
pub async fn handle_voice_text(
    text: &str,
    state: &mut VoiceConnection,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> bool {
    let msg = match VoiceIncoming::parse(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(session_id = %state.session_id, "Failed to parse voice message: {}", e);
            let error = if state.authenticated {
                SessionError::InvalidMessage
            } else {
                SessionError::MissingToken
            };
            return report_error(error, state, message_tx).await;
        }
    };

    if !state.authenticated {
        return match msg {
            VoiceIncoming::Token { token } => {
                authenticate(&token, state, message_tx, app_state).await
            }
            _ => report_error(SessionError::MissingToken, state, message_tx).await,
        };
    }

    match handle_voice_message(msg, state, message_tx).await {
        Ok(()) => true,
        Err(e) => report_error(e, state, message_tx).await,
    }
}

async fn handle_voice_message(
    msg: VoiceIncoming,
    state: &mut VoiceConnection,
    message_tx: &Sender,
) -> SessionResult<()> {
    match msg {
        VoiceIncoming::PrepareVoiceModel => {
            info!(session_id = %state.session_id, "Voice test prepared");
            send(message_tx, VoiceOutgoing::ready()).await;
        }
        VoiceIncoming::ExpectSymbol { orientation } => {
            let orientation = orientation.ok_or(SessionError::MissingField("orientation"))?;
            let command = orientation
                .parse::<Command>()
                .ok()
                .filter(Command::is_direction)
                .ok_or_else(|| SessionError::InvalidOrientation(orientation.clone()))?;
            state.voice.expect(command);
        }
        VoiceIncoming::StopListening => state.voice.stop(),
        VoiceIncoming::VoiceInput { text } => {
            let text = text.ok_or(SessionError::MissingField("text"))?;
            let outcome = state.voice.evaluate(&text);
            debug!(session_id = %state.session_id, ?outcome, text = %text, "Voice input evaluated");
            if outcome.is_reported() {
                send(message_tx, VoiceOutgoing::outcome(outcome, text)).await;
            }
        }
        VoiceIncoming::Token { .. } | VoiceIncoming::Empty => {
            debug!(session_id = %state.session_id, "Ignoring voice message without command");
        }
        VoiceIncoming::Unknown { command } => return Err(SessionError::UnknownCommand(command)),
    }
    Ok(())
}

async fn authenticate(
    token: &str,
    state: &mut VoiceConnection,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> bool {
    match app_state.verifier.verify(token).await {
        Ok(auth) => {
            info!(
                session_id = %state.session_id,
                client = auth.display_name(),
                "Voice session authenticated"
            );
            send(message_tx, VoiceOutgoing::authenticated(auth.display_name())).await;
            state.auth = auth;
            state.authenticated = true;
            true
        }
        Err(e) => report_error(SessionError::Auth(e), state, message_tx).await,
    }
}

async fn report_error(error: SessionError, state: &VoiceConnection, message_tx: &Sender) -> bool {
    match &error {
        SessionError::Auth(auth_error) => auth_error.log(),
        other => warn!(session_id = %state.session_id, "Voice session error: {}", other),
    }

    send(message_tx, VoiceOutgoing::error(error.to_message())).await;

    if error.is_fatal() {
        let _ = message_tx
            .send(MessageRoute::Close {
                code: close_code::POLICY,
                reason: error.to_message(),
            })
            .await;
        return false;
    }
    true
}

async fn send(message_tx: &Sender, message: VoiceOutgoing) {
    let _ = message_tx.send(MessageRoute::Outgoing(message)).await;
}
