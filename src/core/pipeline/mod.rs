//! Frame pipeline: decode, detect, decide, annotate.
//!
//! One call handles one client frame end to end and always produces a
//! [`FrameResponse`]; failures are reported in the response, never raised.

pub mod frame;
pub mod overlay;

use std::sync::Arc;

use image::RgbImage;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::core::calibration::{CalibrationContext, Decision};
use crate::core::detector::{DetectedFace, DetectorError, FaceDetector};
use crate::core::distance::ReferenceBox;

pub use frame::{FrameError, MAX_FRAME_WIDTH, cap_width, decode_frame, select_largest_face};
pub use overlay::{OverlayRenderer, OverlayScene, PREVIEW_JPEG_QUALITY, encode_data_uri};

pub const MSG_NO_FACE: &str = "No face detected";
pub const MSG_LOW_CONFIDENCE: &str = "Face detected but confidence too low";
pub const MSG_CALIBRATED: &str = "Calibration complete";
pub const MSG_DISTANCE_OFF: &str = "Face detected, but distance mode is off.";
pub const ERR_INVALID_IMAGE: &str = "Invalid image";
pub const ERR_DETECTOR_UNAVAILABLE: &str = "Face detector unavailable";
pub const ERR_DETECTION_FAILED: &str = "Face detection failed";

/// Face entry of a measurement response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceReport {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    /// Rounded to two decimals
    pub confidence: f64,
    /// Smoothed distance in meters
    pub distance: f64,
}

/// Response to one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameResponse {
    pub success: bool,
    pub face_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faces: Option<Vec<FaceReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_box: Option<ReferenceBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_target_distance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            face_detected: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

pub struct FramePipeline {
    detector: Arc<dyn FaceDetector>,
    overlay: OverlayRenderer,
    max_width: u32,
}

impl FramePipeline {
    pub fn new(detector: Arc<dyn FaceDetector>, overlay: OverlayRenderer) -> Self {
        Self {
            detector,
            overlay,
            max_width: MAX_FRAME_WIDTH,
        }
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Process one base64 frame against `context`.
    ///
    /// The context lock is only held while deciding, not during detection
    /// or rendering.
    pub fn process(&self, payload: &str, context: &Mutex<CalibrationContext>) -> FrameResponse {
        let frame = match decode_frame(payload) {
            Ok(frame) => cap_width(frame, self.max_width),
            Err(e) => {
                warn!("Rejected frame: {}", e);
                return FrameResponse::failure(ERR_INVALID_IMAGE);
            }
        };

        let faces = match self.detector.detect(&frame, frame.dimensions()) {
            Ok(faces) => faces,
            Err(DetectorError::Unavailable(reason)) => {
                debug!("Frame dropped, detector unavailable: {}", reason);
                return FrameResponse::failure(ERR_DETECTOR_UNAVAILABLE);
            }
            Err(e) => {
                error!(detector = self.detector.name(), "Face detection failed: {}", e);
                return FrameResponse::failure(ERR_DETECTION_FAILED);
            }
        };
        debug!(count = faces.len(), "Faces detected");

        let (decision, settings) = {
            let mut ctx = context.lock();
            let decision = ctx.decide(select_largest_face(&faces));
            (decision, *ctx.settings())
        };

        let mut scene = OverlayScene {
            target_distance_m: settings.target_distance_m,
            target_tolerance_m: settings.target_tolerance_m,
            ..Default::default()
        };

        let mut response = match decision {
            Decision::NoFace { reference_box } => {
                scene.reference_box = reference_box;
                FrameResponse {
                    success: false,
                    face_detected: false,
                    reference_box,
                    message: Some(MSG_NO_FACE.to_string()),
                    ..Default::default()
                }
            }
            Decision::LowConfidence { reference_box, .. } => {
                scene.reference_box = reference_box;
                FrameResponse {
                    success: false,
                    face_detected: false,
                    message: Some(MSG_LOW_CONFIDENCE.to_string()),
                    ..Default::default()
                }
            }
            Decision::Calibrated { focal_length, .. } => {
                scene.faces = &faces;
                FrameResponse {
                    success: true,
                    face_detected: true,
                    focal_length: Some(focal_length),
                    message: Some(MSG_CALIBRATED.to_string()),
                    ..Default::default()
                }
            }
            Decision::Measured {
                face,
                sample,
                focal_length,
                reference_box,
            } => {
                scene.faces = &faces;
                scene.reference_box = reference_box;
                scene.focal_length = Some(focal_length);
                scene.at_target = sample.at_target;
                FrameResponse {
                    success: true,
                    face_detected: true,
                    faces: Some(vec![face_report(&face, sample.smoothed)]),
                    focal_length: Some(focal_length),
                    reference_box,
                    at_target_distance: Some(sample.at_target),
                    ..Default::default()
                }
            }
            Decision::DetectedOnly { .. } => {
                scene.faces = &faces;
                FrameResponse {
                    success: true,
                    face_detected: true,
                    message: Some(MSG_DISTANCE_OFF.to_string()),
                    ..Default::default()
                }
            }
        };

        response.processed_image = self.render(&frame, &scene);
        response
    }

    fn render(&self, frame: &RgbImage, scene: &OverlayScene<'_>) -> Option<String> {
        match self.overlay.render(frame, scene) {
            Ok(uri) => Some(uri),
            Err(e) => {
                warn!("Failed to render preview: {}", e);
                None
            }
        }
    }
}

fn face_report(face: &DetectedFace, distance: f64) -> FaceReport {
    FaceReport {
        x: face.x as i64,
        y: face.y as i64,
        width: face.width as i64,
        height: face.height as i64,
        confidence: (f64::from(face.confidence) * 100.0).round() / 100.0,
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibration::OperatingMode;
    use crate::core::detector::UnavailableDetector;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use image::ImageFormat;
    use std::io::Cursor;

    struct FixedDetector(Vec<DetectedFace>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _: &RgbImage, _: (u32, u32)) -> Result<Vec<DetectedFace>, DetectorError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn frame_payload() -> String {
        let mut bytes = Vec::new();
        RgbImage::new(320, 240)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    fn pipeline(faces: Vec<DetectedFace>) -> FramePipeline {
        FramePipeline::new(Arc::new(FixedDetector(faces)), OverlayRenderer::new())
    }

    #[test]
    fn test_calibration_frame() {
        let pipeline = pipeline(vec![DetectedFace::new(100.0, 50.0, 150.0, 180.0, 0.5)]);
        let context = Mutex::new(CalibrationContext::default());
        context.lock().start_calibration();

        let response = pipeline.process(&frame_payload(), &context);
        assert!(response.success);
        assert!(response.face_detected);
        assert_eq!(response.message.as_deref(), Some(MSG_CALIBRATED));
        assert!((response.focal_length.unwrap() - 700.0).abs() < 1e-9);
        assert!(response.processed_image.is_some());
        assert_eq!(context.lock().mode(), OperatingMode::Idle);
    }

    #[test]
    fn test_no_face_while_measuring() {
        let pipeline = pipeline(vec![]);
        let context = Mutex::new(CalibrationContext::default());
        context.lock().start_distance(Some(700.0)).unwrap();

        let response = pipeline.process(&frame_payload(), &context);
        assert!(!response.success);
        assert!(!response.face_detected);
        assert!(response.faces.is_none());
        assert_eq!(response.reference_box, Some(ReferenceBox { width: 26, height: 39 }));
        assert_eq!(response.message.as_deref(), Some(MSG_NO_FACE));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("faces").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_measurement_frame_picks_largest_face() {
        let pipeline = pipeline(vec![
            DetectedFace::new(0.0, 0.0, 20.0, 20.0, 0.95),
            DetectedFace::new(10.5, 20.7, 35.0, 40.0, 0.876),
        ]);
        let context = Mutex::new(CalibrationContext::default());
        context.lock().start_distance(Some(700.0)).unwrap();

        let response = pipeline.process(&frame_payload(), &context);
        assert!(response.success);
        let faces = response.faces.unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].x, 10);
        assert_eq!(faces[0].y, 20);
        assert_eq!(faces[0].confidence, 0.88);
        assert_eq!(faces[0].distance, 3.0);
        assert_eq!(response.at_target_distance, Some(false));
        assert_eq!(response.focal_length, Some(700.0));
    }

    #[test]
    fn test_low_confidence_frame() {
        let pipeline = pipeline(vec![DetectedFace::new(0.0, 0.0, 150.0, 150.0, 0.2)]);
        let context = Mutex::new(CalibrationContext::default());
        context.lock().start_calibration();

        let response = pipeline.process(&frame_payload(), &context);
        assert!(!response.success);
        assert!(!response.face_detected);
        assert_eq!(response.message.as_deref(), Some(MSG_LOW_CONFIDENCE));
        assert_eq!(context.lock().mode(), OperatingMode::Calibrating);
    }

    /// Sum of the red channel over a rectangular region of the decoded preview
    fn red_energy(image: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> u64 {
        let mut total = 0u64;
        for y in ys {
            for x in xs.clone() {
                total += u64::from(image.get_pixel(x, y)[0]);
            }
        }
        total
    }

    #[test]
    fn test_low_confidence_while_measuring_draws_guide() {
        let pipeline = pipeline(vec![DetectedFace::new(0.0, 0.0, 26.25, 30.0, 0.2)]);
        let context = Mutex::new(CalibrationContext::default());
        context.lock().start_distance(Some(700.0)).unwrap();

        let response = pipeline.process(&frame_payload(), &context);
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some(MSG_LOW_CONFIDENCE));

        // 26x39 guide centered on a 320x240 frame: left edge at x=147
        let preview = decode_frame(&response.processed_image.unwrap()).unwrap();
        let on_edge = red_energy(&preview, 144..152, 105..135);
        let background = red_energy(&preview, 250..258, 105..135);
        assert!(on_edge > background + 1000, "edge={on_edge} background={background}");
    }

    #[test]
    fn test_idle_frame_reports_detection() {
        let pipeline = pipeline(vec![DetectedFace::new(0.0, 0.0, 150.0, 150.0, 0.8)]);
        let context = Mutex::new(CalibrationContext::default());

        let response = pipeline.process(&frame_payload(), &context);
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some(MSG_DISTANCE_OFF));
    }

    #[test]
    fn test_invalid_image_keeps_state() {
        let pipeline = pipeline(vec![]);
        let context = Mutex::new(CalibrationContext::default());
        context.lock().start_calibration();

        let response = pipeline.process("data:image/png;base64,AAAA", &context);
        assert_eq!(response, FrameResponse::failure(ERR_INVALID_IMAGE));
        assert_eq!(context.lock().mode(), OperatingMode::Calibrating);
    }

    #[test]
    fn test_unavailable_detector_fails_uniformly() {
        let pipeline = FramePipeline::new(
            Arc::new(UnavailableDetector::new("no model")),
            OverlayRenderer::new(),
        );
        let context = Mutex::new(CalibrationContext::default());

        for _ in 0..2 {
            let response = pipeline.process(&frame_payload(), &context);
            assert_eq!(response.error.as_deref(), Some(ERR_DETECTOR_UNAVAILABLE));
            assert!(!response.success);
        }
    }
}
