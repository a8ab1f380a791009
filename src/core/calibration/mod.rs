//! Calibration / measurement state and its per-connection registry.

pub mod registry;
pub mod state;

pub use registry::{CalibrationRegistry, CalibrationScope, SharedContext};
pub use state::{
    CalibrationContext, CalibrationError, Decision, DistanceSample, MIN_FACE_CONFIDENCE,
    MeasurementSettings, OperatingMode,
};
