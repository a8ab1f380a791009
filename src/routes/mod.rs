pub mod api;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the complete application router
///
/// Browser clients are served from other origins, so CORS allows any origin.
pub fn create_app(app_state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(ws::create_ws_router())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
