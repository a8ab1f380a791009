//! Pinhole-camera distance math.
//!
//! Projected face width is inversely proportional to distance:
//! `width_px = focal_length * KNOWN_FACE_WIDTH_M / distance_m`. The focal
//! length here is a derived calibration scalar, obtained by observing a face
//! at a known reference distance.

use serde::Serialize;

/// Average adult face width in meters
pub const KNOWN_FACE_WIDTH_M: f64 = 0.15;

/// Reference distance used during calibration (roughly one arm's length)
pub const DEFAULT_REFERENCE_DISTANCE_M: f64 = 0.7;

/// Distance the user is guided towards during measurement
pub const DEFAULT_TARGET_DISTANCE_M: f64 = 4.0;

/// Allowed absolute deviation from the target distance
pub const DEFAULT_TARGET_TOLERANCE_M: f64 = 0.2;

/// Outcome of a distance computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceEstimate {
    /// No focal length has been calibrated yet
    Uncalibrated,
    /// The observed face width was zero or negative
    InvalidWidth,
    /// Distance in meters, rounded to two decimals
    Meters(f64),
}

impl DistanceEstimate {
    /// Numeric value of a valid estimate
    pub fn meters(&self) -> Option<f64> {
        match self {
            DistanceEstimate::Meters(m) => Some(*m),
            _ => None,
        }
    }

    /// Legacy wire representation: meters, or `-1.0` for any invalid estimate
    pub fn sentinel(&self) -> f64 {
        self.meters().unwrap_or(-1.0)
    }
}

/// Compute the focal length from a face observed at `known_distance_m`.
///
/// Callers must only invoke this with a width from a confidently detected face.
pub fn calibrate_focal_length(observed_width_px: f64, known_distance_m: f64) -> f64 {
    observed_width_px * known_distance_m / KNOWN_FACE_WIDTH_M
}

/// Estimate camera-to-face distance from the observed face width
pub fn estimate_distance(observed_width_px: f64, focal_length: Option<f64>) -> DistanceEstimate {
    let Some(focal_length) = focal_length else {
        return DistanceEstimate::Uncalibrated;
    };

    if !(observed_width_px > 0.0) {
        return DistanceEstimate::InvalidWidth;
    }

    DistanceEstimate::Meters(round2(KNOWN_FACE_WIDTH_M * focal_length / observed_width_px))
}

/// Face width in pixels expected at `distance_m`, floored.
///
/// Returns 0 when uncalibrated or for a non-positive distance.
pub fn expected_width_at(distance_m: f64, focal_length: Option<f64>) -> u32 {
    match focal_length {
        Some(focal_length) if distance_m > 0.0 => {
            let width = (KNOWN_FACE_WIDTH_M * focal_length / distance_m).floor();
            if width.is_finite() && width > 0.0 {
                width as u32
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Whether `distance` lies within `tolerance` of `target`
pub fn is_at_target(distance: f64, target: f64, tolerance: f64) -> bool {
    (distance - target).abs() <= tolerance
}

/// Expected face box at a target distance, used for the on-screen guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceBox {
    pub width: u32,
    pub height: u32,
}

impl ReferenceBox {
    /// Reference box for `distance_m`, or `None` when it would be empty.
    /// Faces are assumed to be 1.5x taller than wide.
    pub fn at_distance(distance_m: f64, focal_length: Option<f64>) -> Option<Self> {
        let width = expected_width_at(distance_m, focal_length);
        if width == 0 {
            return None;
        }

        Some(Self {
            width,
            height: (f64::from(width) * 1.5) as u32,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibrate_focal_length_default_reference() {
        // 150px wide face at 0.7m
        let focal = calibrate_focal_length(150.0, DEFAULT_REFERENCE_DISTANCE_M);
        assert!((focal - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_distance_uncalibrated() {
        assert_eq!(
            estimate_distance(120.0, None),
            DistanceEstimate::Uncalibrated
        );
        assert_eq!(estimate_distance(120.0, None).sentinel(), -1.0);
    }

    #[test]
    fn test_estimate_distance_invalid_width() {
        assert_eq!(
            estimate_distance(0.0, Some(700.0)),
            DistanceEstimate::InvalidWidth
        );
        assert_eq!(
            estimate_distance(-5.0, Some(700.0)),
            DistanceEstimate::InvalidWidth
        );
        assert_eq!(
            estimate_distance(f64::NAN, Some(700.0)),
            DistanceEstimate::InvalidWidth
        );
    }

    #[test]
    fn test_estimate_distance_rounds_to_two_decimals() {
        // 0.15 * 700 / 33 = 3.1818...
        assert_eq!(
            estimate_distance(33.0, Some(700.0)),
            DistanceEstimate::Meters(3.18)
        );
    }

    #[test]
    fn test_distance_inverts_calibration() {
        for width in [40.0, 87.5, 150.0, 233.0, 612.0] {
            for distance in [0.5, 0.7, 1.3, 4.0] {
                let focal = calibrate_focal_length(width, distance);
                let estimate = estimate_distance(width, Some(focal)).meters().unwrap();
                assert!(
                    (estimate - distance).abs() <= 0.005 + 1e-9,
                    "width={width} distance={distance} estimate={estimate}"
                );
            }
        }
    }

    #[test]
    fn test_expected_width_at() {
        // 0.15 * 700 / 4 = 26.25 -> 26
        assert_eq!(expected_width_at(4.0, Some(700.0)), 26);
        assert_eq!(expected_width_at(4.0, None), 0);
        assert_eq!(expected_width_at(0.0, Some(700.0)), 0);
    }

    #[test]
    fn test_is_at_target() {
        assert!(is_at_target(4.0, 4.0, 0.0));
        assert!(is_at_target(4.15, 4.0, 0.2));
        assert!(is_at_target(3.8, 4.0, 0.25));
        assert!(!is_at_target(4.3, 4.0, 0.2));
        assert!(!is_at_target(-1.0, 4.0, 0.2));
    }

    #[test]
    fn test_reference_box() {
        let reference = ReferenceBox::at_distance(4.0, Some(700.0)).unwrap();
        assert_eq!(reference, ReferenceBox { width: 26, height: 39 });
        assert!(ReferenceBox::at_distance(4.0, None).is_none());
    }
}
