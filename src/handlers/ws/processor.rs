//! Message processing for the calibration channels
//!
//! Routes parsed messages to the calibration context and frame pipeline.
//! Messages of one session are handled strictly in arrival order.

use std::sync::Arc;

use axum::extract::ws::close_code;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::pipeline::{ERR_INVALID_IMAGE, FrameResponse};
use crate::state::AppState;

use super::{
    error::{SessionError, SessionResult},
    messages::{IncomingMessage, MessageRoute, OutgoingMessage},
    state::ConnectionState,
};

pub const CALIBRATION_PROMPT: &str = "Please stand at one-arm distance and click Capture";
pub const MEASUREMENT_STOPPED: &str = "Measurement stopped";
pub const CALIBRATION_GREETING: &str = "Connected to calibration service";

type Sender = mpsc::Sender<MessageRoute<OutgoingMessage>>;

/// Whether the next message must carry the session token
pub fn awaiting_auth(state: &ConnectionState, app_state: &AppState) -> bool {
    state.profile.allows_measurement() && !state.authenticated && app_state.verifier.required()
}

/// Handle one parsed message. Returns false when the session must end.
pub async fn handle_incoming_message(
    msg: IncomingMessage,
    state: &mut ConnectionState,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> bool {
    if awaiting_auth(state, app_state) {
        return handle_authentication(msg, state, message_tx, app_state).await;
    }

    let result = match msg {
        IncomingMessage::StartCalibration => handle_start_calibration(state, message_tx).await,
        IncomingMessage::StartDistance { focal_length } => {
            handle_start_distance(focal_length, state, message_tx).await
        }
        IncomingMessage::StopAll => handle_stop_all(state, message_tx).await,
        IncomingMessage::Capture { image } => {
            handle_capture(image, state, message_tx, app_state).await
        }
        IncomingMessage::Frame { image } => handle_frame(image, state, message_tx, app_state).await,
        IncomingMessage::Token { .. } => {
            debug!(session_id = %state.session_id, "Ignoring token message on authenticated session");
            Ok(())
        }
        IncomingMessage::Unknown { command } => Err(SessionError::UnknownCommand(command)),
        IncomingMessage::Empty => {
            debug!(session_id = %state.session_id, "Ignoring message without command or image");
            Ok(())
        }
    };

    match result {
        Ok(()) => true,
        Err(e) => report_error(e, state, message_tx).await,
    }
}

/// Handle a text message that is not valid JSON
pub async fn handle_invalid_message(
    state: &ConnectionState,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> bool {
    let error = if awaiting_auth(state, app_state) {
        SessionError::MissingToken
    } else {
        SessionError::InvalidMessage
    };
    report_error(error, state, message_tx).await
}

/// Send `error` to the client. Fatal errors also close the socket.
pub async fn report_error(error: SessionError, state: &ConnectionState, message_tx: &Sender) -> bool {
    match &error {
        SessionError::Internal(detail) => {
            error!(session_id = %state.session_id, "Internal session error: {}", detail)
        }
        SessionError::Auth(auth_error) => auth_error.log(),
        other => warn!(session_id = %state.session_id, "Session error: {}", other),
    }

    let _ = message_tx
        .send(MessageRoute::Outgoing(OutgoingMessage::error(error.to_message())))
        .await;

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

async fn handle_authentication(
    msg: IncomingMessage,
    state: &mut ConnectionState,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> bool {
    let IncomingMessage::Token { token } = msg else {
        return report_error(SessionError::MissingToken, state, message_tx).await;
    };

    match app_state.verifier.verify(&token).await {
        Ok(auth) => {
            info!(
                session_id = %state.session_id,
                client = auth.display_name(),
                "Session authenticated"
            );
            let greeting = format!("Authenticated successfully as {}", auth.display_name());
            state.auth = auth;
            state.authenticated = true;
            let _ = message_tx
                .send(MessageRoute::Outgoing(OutgoingMessage::message(greeting)))
                .await;
            true
        }
        Err(e) => report_error(SessionError::Auth(e), state, message_tx).await,
    }
}

async fn handle_start_calibration(state: &ConnectionState, message_tx: &Sender) -> SessionResult<()> {
    state.calibration.lock().start_calibration();
    send_message(message_tx, CALIBRATION_PROMPT).await;
    Ok(())
}

async fn handle_start_distance(
    focal_length: Option<f64>,
    state: &ConnectionState,
    message_tx: &Sender,
) -> SessionResult<()> {
    if !state.profile.allows_measurement() {
        return Err(SessionError::CommandNotAvailable("start_distance".to_string()));
    }

    let focal_length = state.calibration.lock().start_distance(focal_length)?;
    send_message(
        message_tx,
        format!("Distance measurement started with focal length: {focal_length:?}"),
    )
    .await;
    Ok(())
}

async fn handle_stop_all(state: &ConnectionState, message_tx: &Sender) -> SessionResult<()> {
    if !state.profile.allows_measurement() {
        return Err(SessionError::CommandNotAvailable("stop_all".to_string()));
    }

    state.calibration.lock().stop_all();
    send_message(message_tx, MEASUREMENT_STOPPED).await;
    Ok(())
}

async fn handle_capture(
    image: Option<String>,
    state: &ConnectionState,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> SessionResult<()> {
    // Captures bypass the rate limiter and do not reset it
    let response = match image {
        Some(image) => process_frame(image, state, app_state).await?,
        None => FrameResponse::failure(ERR_INVALID_IMAGE),
    };
    send_frame(message_tx, response).await;
    Ok(())
}

async fn handle_frame(
    image: String,
    state: &mut ConnectionState,
    message_tx: &Sender,
    app_state: &Arc<AppState>,
) -> SessionResult<()> {
    if !state.rate_limiter.try_acquire() {
        debug!(session_id = %state.session_id, "Frame dropped by rate limiter");
        return Ok(());
    }

    let response = process_frame(image, state, app_state).await?;
    send_frame(message_tx, response).await;
    Ok(())
}

/// Run the frame pipeline off the async runtime
async fn process_frame(
    image: String,
    state: &ConnectionState,
    app_state: &Arc<AppState>,
) -> SessionResult<FrameResponse> {
    let pipeline = Arc::clone(&app_state.core_state.pipeline);
    let context = Arc::clone(&state.calibration);

    tokio::task::spawn_blocking(move || pipeline.process(&image, &context))
        .await
        .map_err(|e| SessionError::Internal(format!("frame processing task failed: {e}")))
}

async fn send_message(message_tx: &Sender, message: impl Into<String>) {
    let _ = message_tx
        .send(MessageRoute::Outgoing(OutgoingMessage::message(message)))
        .await;
}

async fn send_frame(message_tx: &Sender, response: FrameResponse) {
    let _ = message_tx
        .send(MessageRoute::Outgoing(response.into()))
        .await;
}
