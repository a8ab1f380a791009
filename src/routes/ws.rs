use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{voice_ws, ws};
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// `/ws` and `/ws_voice` authenticate inside the socket: the token is the
/// first message (or `?token=` for the voice channel) so browser clients
/// need no custom upgrade headers. `/ws/calibration` is open and limited to
/// calibration commands.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/ws/calibration", get(ws::ws_calibration_handler))
        .route("/ws_voice", get(voice_ws::ws_voice_handler))
        .layer(TraceLayer::new_for_http())
}
