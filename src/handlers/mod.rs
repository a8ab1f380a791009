//! HTTP and WebSocket request handlers
//!
//! This module organizes all handlers into logical groups:
//! - `api` - Health check endpoint
//! - `ws` - Calibration and distance measurement channels
//! - `voice_ws` - Voice command channel

pub mod api;
pub mod voice_ws;
pub mod ws;

// Re-export commonly used handlers for convenient access
pub use voice_ws::ws_voice_handler;
pub use ws::{ws_calibration_handler, ws_handler};
