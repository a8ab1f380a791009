use std::sync::Arc;

use crate::auth::{TokenVerifier, verifier_from_config};
use crate::config::ServerConfig;
use crate::core::{CoreState, FaceDetector};

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state: frame pipeline and calibration registry
    pub core_state: Arc<CoreState>,
    /// Verifier for session tokens
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let core_state = CoreState::new(&config).await;
        let verifier = verifier_from_config(&config);

        Arc::new(Self {
            config,
            core_state,
            verifier,
        })
    }

    /// Build state around an injected detector; used by tests and embedders
    pub fn with_detector(config: ServerConfig, detector: Arc<dyn FaceDetector>) -> Arc<Self> {
        let core_state = CoreState::with_detector(&config, detector);
        let verifier = verifier_from_config(&config);

        Arc::new(Self {
            config,
            core_state,
            verifier,
        })
    }
}
