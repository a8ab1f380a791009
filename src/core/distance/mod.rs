//! Distance model: pinhole-camera math and temporal smoothing.

pub mod model;
pub mod smoother;

pub use model::{
    DEFAULT_REFERENCE_DISTANCE_M, DEFAULT_TARGET_DISTANCE_M, DEFAULT_TARGET_TOLERANCE_M,
    DistanceEstimate, KNOWN_FACE_WIDTH_M, ReferenceBox, calibrate_focal_length,
    estimate_distance, expected_width_at, is_at_target,
};
pub use smoother::{DistanceHistory, HISTORY_CAPACITY};
