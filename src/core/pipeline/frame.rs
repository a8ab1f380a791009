//! Frame decoding and sizing.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::RgbImage;
use image::imageops::{self, FilterType};
use thiserror::Error;

use crate::core::detector::DetectedFace;

/// Frames wider than this are downscaled before detection
pub const MAX_FRAME_WIDTH: u32 = 640;

/// Frame input errors. None of these mutate calibration state.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Empty image payload")]
    Empty,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Undecodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a base64 image, optionally wrapped in a data URI.
///
/// With a data URI everything after the last comma is the payload.
pub fn decode_frame(payload: &str) -> Result<RgbImage, FrameError> {
    let encoded = match payload.rfind(',') {
        Some(idx) => &payload[idx + 1..],
        None => payload,
    };
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(FrameError::Empty);
    }

    let bytes = BASE64.decode(encoded)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(image.to_rgb8())
}

/// Downscale `frame` to at most `max_width` pixels wide, keeping aspect ratio
pub fn cap_width(frame: RgbImage, max_width: u32) -> RgbImage {
    let (width, height) = frame.dimensions();
    if width <= max_width {
        return frame;
    }

    let scale = f64::from(max_width) / f64::from(width);
    let new_height = ((f64::from(height) * scale) as u32).max(1);
    imageops::resize(&frame, max_width, new_height, FilterType::Triangle)
}

/// Largest face by area. On ties the first one encountered wins.
pub fn select_largest_face(faces: &[DetectedFace]) -> Option<&DetectedFace> {
    faces
        .iter()
        .reduce(|best, face| if face.area() > best.area() { face } else { best })
}
