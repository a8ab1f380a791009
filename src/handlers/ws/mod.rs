//! # Calibration WebSocket Module
//!
//! Real-time face-distance calibration over WebSocket. Clients stream camera
//! frames as base64 data URIs and drive the calibration state machine with
//! control commands.
//!
//! ## Endpoints
//!
//! - `/ws` - primary channel. When authentication is enabled the first
//!   message must be `{"token": "..."}`; any other first message closes the
//!   connection with code 1008. Authentication is off by default
//!   (`AUTH_REQUIRED=false`); in that deployment mode the handshake is skipped
//!   entirely and a warning is logged at startup.
//! - `/ws/calibration` - unauthenticated channel that greets the client and
//!   accepts calibration commands and frames only.
//!
//! ## Incoming Messages
//!
//! - `{"token": "..."}` - authenticate (primary channel, first message)
//! - `{"command": "start_calibration"}` - capture the next usable face as the reference
//! - `{"command": "start_distance", "focal_length": 712.5}` - start measuring
//! - `{"command": "stop_all"}` - return to idle
//! - `{"command": "capture", "image": "data:image/jpeg;base64,..."}` - one-shot frame, never rate limited
//! - `{"image": "data:image/jpeg;base64,..."}` - streamed frame, rate limited per connection
//!
//! ## Outgoing Messages
//!
//! - `{"message": "..."}` - command acknowledgement or greeting
//! - `{"error": "..."}` - protocol or command error
//! - `{"success": true, "face_detected": true, "faces": [...], ...}` - frame result
//!
//! ## JavaScript Client Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8000/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({ token: 'your-api-secret' }));
//!   ws.send(JSON.stringify({ command: 'start_calibration' }));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.focal_length && !msg.faces) {
//!     ws.send(JSON.stringify({ command: 'start_distance', focal_length: msg.focal_length }));
//!   }
//!   if (msg.processed_image) {
//!     preview.src = msg.processed_image;
//!   }
//! };
//!
//! setInterval(() => {
//!   ws.send(JSON.stringify({ image: canvas.toDataURL('image/jpeg', 0.7) }));
//! }, 100);
//! ```

pub mod error;
pub mod handler;
pub mod messages;
pub mod processor;
pub mod state;


// Re-export commonly used items
pub use error::{SessionError, SessionResult};
pub use handler::{ws_calibration_handler, ws_handler};
pub use messages::{IncomingMessage, MessageRoute, OutgoingMessage};
pub use state::{ConnectionState, FrameRateLimiter, SessionProfile};
