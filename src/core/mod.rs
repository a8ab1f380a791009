pub mod calibration;
pub mod detector;
pub mod distance;
pub mod pipeline;
pub mod state;
pub mod voice;

// Re-export commonly used types for convenience
pub use calibration::{
    CalibrationContext, CalibrationError, CalibrationRegistry, CalibrationScope, Decision,
    MeasurementSettings, OperatingMode,
};
pub use detector::{DetectedFace, DetectorError, FaceDetector, UnavailableDetector};
pub use distance::{DistanceEstimate, DistanceHistory, ReferenceBox};
pub use pipeline::{FramePipeline, FrameResponse, OverlayRenderer};
pub use voice::{Command, VoiceOutcome, VoiceSession, classify};

// Re-export CoreState for external use
pub use state::CoreState;
