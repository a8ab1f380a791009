//! Calibration / measurement state machine.
//!
//! Transitions are driven by explicit control commands, plus one implicit
//! transition: a successful calibration frame returns the machine to
//! [`OperatingMode::Idle`].

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::detector::DetectedFace;
use crate::core::distance::{
    DEFAULT_REFERENCE_DISTANCE_M, DEFAULT_TARGET_DISTANCE_M, DEFAULT_TARGET_TOLERANCE_M,
    DistanceEstimate, DistanceHistory, ReferenceBox, calibrate_focal_length, estimate_distance,
    is_at_target,
};

/// Minimum detector confidence for any distance-relevant action
pub const MIN_FACE_CONFIDENCE: f32 = 0.4;

/// Exactly one mode is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    #[default]
    Idle,
    Calibrating,
    Measuring,
}

/// Distances used by calibration and target lock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSettings {
    /// Distance the user stands at while calibrating
    pub reference_distance_m: f64,
    pub target_distance_m: f64,
    pub target_tolerance_m: f64,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            reference_distance_m: DEFAULT_REFERENCE_DISTANCE_M,
            target_distance_m: DEFAULT_TARGET_DISTANCE_M,
            target_tolerance_m: DEFAULT_TARGET_TOLERANCE_M,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("No focal length provided. Please calibrate first.")]
    MissingFocalLength,

    #[error("Focal length must be a positive number, got {0}")]
    InvalidFocalLength(f64),
}

/// One measurement tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    pub raw: f64,
    pub smoothed: f64,
    pub at_target: bool,
}

/// Result of feeding one frame's detection into the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No face was found in the frame
    NoFace { reference_box: Option<ReferenceBox> },
    /// A face was found but below [`MIN_FACE_CONFIDENCE`]
    LowConfidence {
        face: DetectedFace,
        reference_box: Option<ReferenceBox>,
    },
    /// Calibration frame processed; the machine is back to idle
    Calibrated {
        face: DetectedFace,
        focal_length: f64,
    },
    /// Measurement frame processed
    Measured {
        face: DetectedFace,
        sample: DistanceSample,
        focal_length: f64,
        reference_box: Option<ReferenceBox>,
    },
    /// Face found with no active mode, or a measurement could not be computed
    DetectedOnly { face: DetectedFace },
}

/// Calibration state consumed by frame processing
#[derive(Debug, Clone, Default)]
pub struct CalibrationContext {
    mode: OperatingMode,
    focal_length: Option<f64>,
    history: DistanceHistory,
    settings: MeasurementSettings,
}

impl CalibrationContext {
    pub fn new(settings: MeasurementSettings) -> Self {
        Self {
            mode: OperatingMode::Idle,
            focal_length: None,
            history: DistanceHistory::new(),
            settings,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn focal_length(&self) -> Option<f64> {
        self.focal_length
    }

    pub fn settings(&self) -> &MeasurementSettings {
        &self.settings
    }

    pub fn history(&self) -> &DistanceHistory {
        &self.history
    }

    pub fn start_calibration(&mut self) {
        info!(previous = ?self.mode, "Calibration started");
        self.mode = OperatingMode::Calibrating;
    }

    /// Enter measuring mode with `focal_length`.
    ///
    /// On error the mode and stored focal length are left untouched.
    pub fn start_distance(&mut self, focal_length: Option<f64>) -> Result<f64, CalibrationError> {
        let focal_length = focal_length.ok_or(CalibrationError::MissingFocalLength)?;
        if !focal_length.is_finite() || focal_length <= 0.0 {
            return Err(CalibrationError::InvalidFocalLength(focal_length));
        }

        info!(focal_length, "Distance measurement started");
        self.focal_length = Some(focal_length);
        self.mode = OperatingMode::Measuring;
        Ok(focal_length)
    }

    pub fn stop_all(&mut self) {
        info!(previous = ?self.mode, "Measurement stopped");
        self.mode = OperatingMode::Idle;
    }

    /// Guide box at the target distance, if calibrated
    pub fn reference_box(&self) -> Option<ReferenceBox> {
        ReferenceBox::at_distance(self.settings.target_distance_m, self.focal_length)
    }

    /// Guide box while measuring, `None` in any other mode
    fn measuring_reference_box(&self) -> Option<ReferenceBox> {
        match self.mode {
            OperatingMode::Measuring => self.reference_box(),
            _ => None,
        }
    }

    pub fn is_at_target(&self, distance: f64) -> bool {
        is_at_target(
            distance,
            self.settings.target_distance_m,
            self.settings.target_tolerance_m,
        )
    }

    /// Consume one detection result
    pub fn decide(&mut self, face: Option<&DetectedFace>) -> Decision {
        let Some(face) = face.copied() else {
            return Decision::NoFace {
                reference_box: self.measuring_reference_box(),
            };
        };

        if face.confidence < MIN_FACE_CONFIDENCE {
            debug!(confidence = face.confidence, "Face confidence below threshold");
            return Decision::LowConfidence {
                face,
                reference_box: self.measuring_reference_box(),
            };
        }

        match (self.mode, self.focal_length) {
            (OperatingMode::Calibrating, _) => {
                let focal_length = calibrate_focal_length(
                    f64::from(face.width),
                    self.settings.reference_distance_m,
                );
                info!(focal_length, face_width = face.width, "Focal length calibrated");
                self.focal_length = Some(focal_length);
                self.mode = OperatingMode::Idle;
                Decision::Calibrated { face, focal_length }
            }
            (OperatingMode::Measuring, Some(focal_length)) => {
                match estimate_distance(f64::from(face.width), Some(focal_length)) {
                    DistanceEstimate::Meters(raw) => {
                        let smoothed = self.history.smooth(raw);
                        let sample = DistanceSample {
                            raw,
                            smoothed,
                            at_target: self.is_at_target(smoothed),
                        };
                        debug!(raw, smoothed, at_target = sample.at_target, "Distance measured");
                        Decision::Measured {
                            face,
                            sample,
                            focal_length,
                            reference_box: self.reference_box(),
                        }
                    }
                    estimate => {
                        debug!(?estimate, "Distance could not be computed");
                        Decision::DetectedOnly { face }
                    }
                }
            }
            _ => Decision::DetectedOnly { face },
        }
    }
}
