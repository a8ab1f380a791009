//! # Voice Command WebSocket Module
//!
//! Clients send utterances already transcribed to text; the server answers
//! whether they match the symbol currently on screen.
//!
//! ## Incoming Messages
//!
//! - `{"token": "..."}` - authenticate when no `?token=` was given
//! - `{"command": "prepare_voice_model"}` - answered with `{"status": "ready_for_test"}`
//! - `{"command": "START_SYMBOL" | "NEXT_SYMBOL", "orientation": "left"}` - set the expected direction
//! - `{"command": "STOP_LISTENING"}` - clear the expected direction
//! - `{"command": "VOICE_INPUT", "text": "go left"}` - evaluate an utterance
//!
//! ## Outgoing Messages
//!
//! - `{"status": "authenticated", "user": "..."}`
//! - `{"status": "CORRECT" | "INCORRECT" | "UNRECOGNIZED" | "PAUSE_REQUESTED", "text": "..."}`
//! - `{"error": "..."}`
//!
//! A direction heard while nothing is expected produces no response.

pub mod handler;
pub mod messages;

pub use handler::{VoiceConnection, ws_voice_handler};
pub use messages::{VoiceIncoming, VoiceOutgoing};
