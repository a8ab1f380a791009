pub mod api_secret;
pub mod context;
pub mod verifier;

// Re-export commonly used items
pub use api_secret::match_api_secret_id;
pub use context::Auth;
pub use verifier::{AllowAllVerifier, ConfiguredVerifier, TokenClaims, TokenVerifier};

use std::sync::Arc;

use tracing::warn;

use crate::config::ServerConfig;

/// Build the verifier matching the configuration.
///
/// With `auth_required` off, `/ws` skips the token handshake and `/ws_voice`
/// authenticates every session as anonymous.
pub fn verifier_from_config(config: &ServerConfig) -> Arc<dyn TokenVerifier> {
    if config.auth_required {
        Arc::new(ConfiguredVerifier::from_config(config))
    } else {
        warn!(
            "Authentication is disabled (AUTH_REQUIRED=false): sessions on /ws and /ws_voice are not verified"
        );
        Arc::new(AllowAllVerifier)
    }
}
