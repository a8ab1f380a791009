//! Voice channel message types

use serde::{Deserialize, Serialize};

use crate::core::voice::VoiceOutcome;

#[derive(Debug, Default, Deserialize)]
struct RawVoiceMessage {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    orientation: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceIncoming {
    PrepareVoiceModel,
    /// `START_SYMBOL` or `NEXT_SYMBOL`
    ExpectSymbol { orientation: Option<String> },
    StopListening,
    VoiceInput { text: Option<String> },
    Token { token: String },
    Unknown { command: String },
    Empty,
}

impl VoiceIncoming {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawVoiceMessage = serde_json::from_str(text)?;

        let message = match raw.command {
            Some(command) => match command.as_str() {
                "prepare_voice_model" => VoiceIncoming::PrepareVoiceModel,
                "START_SYMBOL" | "NEXT_SYMBOL" => VoiceIncoming::ExpectSymbol {
                    orientation: raw.orientation,
                },
                "STOP_LISTENING" => VoiceIncoming::StopListening,
                "VOICE_INPUT" => VoiceIncoming::VoiceInput { text: raw.text },
                _ => VoiceIncoming::Unknown { command },
            },
            None => match raw.token {
                Some(token) => VoiceIncoming::Token { token },
                None => VoiceIncoming::Empty,
            },
        };

        Ok(message)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum VoiceOutgoing {
    Authenticated { status: &'static str, user: String },
    Ready { status: &'static str },
    Outcome { status: VoiceOutcome, text: String },
    Error { error: String },
}

impl VoiceOutgoing {
    pub fn authenticated(user: impl Into<String>) -> Self {
        VoiceOutgoing::Authenticated {
            status: "authenticated",
            user: user.into(),
        }
    }

    pub fn ready() -> Self {
        VoiceOutgoing::Ready {
            status: "ready_for_test",
        }
    }

    pub fn outcome(status: VoiceOutcome, text: impl Into<String>) -> Self {
        VoiceOutgoing::Outcome {
            status,
            text: text.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        VoiceOutgoing::Error {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_voice_commands() {
        assert_eq!(
            VoiceIncoming::parse(r#"{"command":"prepare_voice_model"}"#).unwrap(),
            VoiceIncoming::PrepareVoiceModel
        );
        assert_eq!(
            VoiceIncoming::parse(r#"{"command":"NEXT_SYMBOL","orientation":"left"}"#).unwrap(),
            VoiceIncoming::ExpectSymbol {
                orientation: Some("left".to_string())
            }
        );
        assert_eq!(
            VoiceIncoming::parse(r#"{"command":"VOICE_INPUT","text":"go up"}"#).unwrap(),
            VoiceIncoming::VoiceInput {
                text: Some("go up".to_string())
            }
        );
        // Command names are case-sensitive on the wire
        assert_eq!(
            VoiceIncoming::parse(r#"{"command":"stop_listening"}"#).unwrap(),
            VoiceIncoming::Unknown {
                command: "stop_listening".to_string()
            }
        );
    }

    #[test]
    fn test_outgoing_shapes() {
        assert_eq!(
            serde_json::to_value(VoiceOutgoing::authenticated("kiosk")).unwrap(),
            json!({"status": "authenticated", "user": "kiosk"})
        );
        assert_eq!(
            serde_json::to_value(VoiceOutgoing::ready()).unwrap(),
            json!({"status": "ready_for_test"})
        );
        assert_eq!(
            serde_json::to_value(VoiceOutgoing::outcome(VoiceOutcome::PauseRequested, "Stop!"))
                .unwrap(),
            json!({"status": "PAUSE_REQUESTED", "text": "Stop!"})
        );
    }
}
