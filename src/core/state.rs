use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::calibration::CalibrationRegistry;
use crate::core::detector::{FaceDetector, UnavailableDetector};
#[cfg(feature = "face-detect")]
use crate::core::detector::{YuNetConfig, YuNetDetector};
use crate::core::pipeline::{FramePipeline, OverlayRenderer};

/// Core-specific shared state for the application.
///
/// Holds the frame pipeline with its face detector, loaded once at startup,
/// and the registry handing calibration contexts to sessions.
pub struct CoreState {
    pub pipeline: Arc<FramePipeline>,
    pub calibration: CalibrationRegistry,
}

impl CoreState {
    /// Initialize core state, loading the detector model and overlay font.
    ///
    /// Load failures are logged and degrade the service; they are never fatal.
    pub async fn new(config: &ServerConfig) -> Arc<Self> {
        let detector_config = config.clone();
        let detector = match tokio::task::spawn_blocking(move || load_detector(&detector_config))
            .await
        {
            Ok(detector) => detector,
            Err(e) => {
                warn!("Face detector loading task failed: {}", e);
                Arc::new(UnavailableDetector::new("detector loading task failed"))
            }
        };

        Self::with_detector(config, detector)
    }

    /// Build core state around an already constructed detector
    pub fn with_detector(config: &ServerConfig, detector: Arc<dyn FaceDetector>) -> Arc<Self> {
        info!(detector = detector.name(), "Face detector ready");

        let overlay = match &config.overlay_font_path {
            Some(path) => OverlayRenderer::from_font_file(path).unwrap_or_else(|e| {
                warn!("Overlay captions disabled: {:#}", e);
                OverlayRenderer::new()
            }),
            None => OverlayRenderer::new(),
        };

        let calibration =
            CalibrationRegistry::new(config.calibration_scope, config.measurement_settings());
        info!(scope = ?config.calibration_scope, "Calibration registry initialized");

        Arc::new(Self {
            pipeline: Arc::new(FramePipeline::new(detector, overlay)),
            calibration,
        })
    }
}

#[cfg(feature = "face-detect")]
fn load_detector(config: &ServerConfig) -> Arc<dyn FaceDetector> {
    let Some(model_path) = &config.detector_model_path else {
        warn!("DETECTOR_MODEL_PATH is not set; frame processing is unavailable");
        return Arc::new(UnavailableDetector::new("no face detector model configured"));
    };

    let yunet_config = YuNetConfig {
        model_path: model_path.clone(),
        score_threshold: config.detector_score_threshold,
        nms_threshold: config.detector_nms_threshold,
        top_k: config.detector_top_k,
    };

    match YuNetDetector::load(yunet_config) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            tracing::error!("Failed to load face detector: {:#}", e);
            Arc::new(UnavailableDetector::new(format!("{e:#}")))
        }
    }
}

#[cfg(not(feature = "face-detect"))]
fn load_detector(config: &ServerConfig) -> Arc<dyn FaceDetector> {
    if config.detector_model_path.is_some() {
        warn!("DETECTOR_MODEL_PATH is set but the face-detect feature is disabled");
    } else {
        warn!("Built without the face-detect feature; frame processing is unavailable");
    }
    Arc::new(UnavailableDetector::new(
        "built without the face-detect feature",
    ))
}
