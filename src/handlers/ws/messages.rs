//! WebSocket message types and routing
//!
//! Incoming messages are JSON objects distinguished by their fields rather
//! than by a tag: `{"command": ...}` is a control command, `{"image": ...}`
//! without a command is a frame, `{"token": ...}` authenticates.

use serde::{Deserialize, Serialize};

use crate::core::pipeline::FrameResponse;

/// Raw wire shape of every incoming message
#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    focal_length: Option<f64>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    StartCalibration,
    StartDistance { focal_length: Option<f64> },
    StopAll,
    /// One-shot frame that bypasses the rate limit
    Capture { image: Option<String> },
    /// Rate-limited frame
    Frame { image: String },
    Token { token: String },
    Unknown { command: String },
    /// A JSON object with none of the recognized fields
    Empty,
}

impl IncomingMessage {
    /// Parse a text frame. Fails on malformed JSON or a non-object payload.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawMessage = serde_json::from_str(text)?;

        let message = match raw.command {
            Some(command) => match command.as_str() {
                "start_calibration" => IncomingMessage::StartCalibration,
                "start_distance" => IncomingMessage::StartDistance {
                    focal_length: raw.focal_length,
                },
                "stop_all" => IncomingMessage::StopAll,
                "capture" => IncomingMessage::Capture { image: raw.image },
                _ => IncomingMessage::Unknown { command },
            },
            None => match (raw.image, raw.token) {
                (Some(image), _) => IncomingMessage::Frame { image },
                (None, Some(token)) => IncomingMessage::Token { token },
                (None, None) => IncomingMessage::Empty,
            },
        };

        Ok(message)
    }
}

/// Outgoing messages of the calibration channels
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Message { message: String },
    Error { error: String },
    Frame(Box<FrameResponse>),
}

impl OutgoingMessage {
    pub fn message(message: impl Into<String>) -> Self {
        OutgoingMessage::Message {
            message: message.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        OutgoingMessage::Error {
            error: error.into(),
        }
    }
}

impl From<FrameResponse> for OutgoingMessage {
    fn from(response: FrameResponse) -> Self {
        OutgoingMessage::Frame(Box::new(response))
    }
}

/// Work item for the socket sender task
#[derive(Debug)]
pub enum MessageRoute<M> {
    Outgoing(M),
    /// Close the socket with a code after flushing earlier messages
    Close { code: u16, reason: String },
}
