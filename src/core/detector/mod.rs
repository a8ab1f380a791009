//! Face detection capability.
//!
//! The frame pipeline only depends on the [`FaceDetector`] trait. The bundled
//! YuNet implementation is feature-gated behind `face-detect`; when disabled,
//! or when the model cannot be loaded, the server runs with an
//! [`UnavailableDetector`] and every frame request fails the same way.

use image::RgbImage;
use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "face-detect")]
pub mod yunet;

#[cfg(feature = "face-detect")]
pub use yunet::{YuNetConfig, YuNetDetector};

/// A face bounding box in pixel coordinates of the frame it was detected in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectedFace {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detector score in `[0, 1]`
    pub confidence: f32,
}

impl DetectedFace {
    pub fn new(x: f32, y: f32, width: f32, height: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Face detector errors
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The detector could not be initialized at startup
    #[error("Face detector unavailable: {0}")]
    Unavailable(String),

    /// Inference failed for this frame
    #[error("Face detection failed: {0}")]
    Inference(String),
}

/// Capability interface for an external face detector
pub trait FaceDetector: Send + Sync {
    /// Detect faces in `frame`. `input_size` is the `(width, height)` the
    /// detector should configure itself for, normally the frame dimensions.
    fn detect(
        &self,
        frame: &RgbImage,
        input_size: (u32, u32),
    ) -> Result<Vec<DetectedFace>, DetectorError>;

    /// Detector name for logging
    fn name(&self) -> &str;
}

/// Detector used when no model could be loaded
#[derive(Debug, Clone)]
pub struct UnavailableDetector {
    reason: String,
}

impl UnavailableDetector {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl FaceDetector for UnavailableDetector {
    fn detect(
        &self,
        _frame: &RgbImage,
        _input_size: (u32, u32),
    ) -> Result<Vec<DetectedFace>, DetectorError> {
        Err(DetectorError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
