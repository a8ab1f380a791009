//! Annotated preview rendering.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::info;

use crate::core::detector::DetectedFace;
use crate::core::distance::{DistanceEstimate, ReferenceBox, estimate_distance};

pub const PREVIEW_JPEG_QUALITY: u8 = 60;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// What to draw on top of a frame
#[derive(Debug, Clone, Default)]
pub struct OverlayScene<'a> {
    /// Faces to outline; empty when nothing should be drawn
    pub faces: &'a [DetectedFace],
    /// Centered target-distance guide, only while measuring
    pub reference_box: Option<ReferenceBox>,
    /// Focal length used to caption each face with its distance
    pub focal_length: Option<f64>,
    /// Whether the smoothed distance is locked on target
    pub at_target: bool,
    /// Target-specific captions
    pub target_distance_m: f64,
    pub target_tolerance_m: f64,
}

/// Draws the preview image. Text captions need a font; without one only
/// boxes are drawn.
#[derive(Clone, Default)]
pub struct OverlayRenderer {
    font: Option<FontArc>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    /// Load a TTF/OTF font for captions
    pub fn from_font_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read overlay font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("Invalid overlay font {}", path.display()))?;
        info!("Loaded overlay font from: {:?}", path);
        Ok(Self::with_font(font))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render `scene` over a copy of `frame` and encode it as a JPEG data URI
    pub fn render(&self, frame: &RgbImage, scene: &OverlayScene<'_>) -> Result<String, image::ImageError> {
        let mut canvas = frame.clone();
        let (width, height) = canvas.dimensions();

        if let Some(reference) = scene.reference_box {
            let ref_x = (width / 2) as i32 - (reference.width / 2) as i32;
            let ref_y = (height / 2) as i32 - (reference.height / 2) as i32;
            let (color, thickness) = if scene.at_target { (GREEN, 3) } else { (RED, 2) };
            draw_box(&mut canvas, ref_x, ref_y, reference.width, reference.height, color, thickness);

            let caption = if scene.at_target {
                format!("PERFECT! {}m REACHED", scene.target_distance_m)
            } else {
                format!("{}m Reference", scene.target_distance_m)
            };
            let scale = if scene.at_target { 20.0 } else { 16.0 };
            self.caption(&mut canvas, ref_x, ref_y - 22, scale, color, &caption);
        }

        for face in scene.faces {
            let (x, y) = (face.x as i32, face.y as i32);
            let (w, h) = (face.width as u32, face.height as u32);
            draw_box(&mut canvas, x, y, w, h, GREEN, 2);
            self.caption(&mut canvas, x, y - 18, 16.0, GREEN, &format!("{:.2}", face.confidence));

            if let Some(focal_length) = scene.focal_length
                && let DistanceEstimate::Meters(distance) =
                    estimate_distance(f64::from(w), Some(focal_length))
            {
                let locked = (distance - scene.target_distance_m).abs() <= scene.target_tolerance_m;
                let color = if locked { GREEN } else { BLUE };
                self.caption(
                    &mut canvas,
                    x,
                    y + h as i32 + 6,
                    20.0,
                    color,
                    &format!("{distance}m"),
                );
            }
        }

        encode_data_uri(&canvas, PREVIEW_JPEG_QUALITY)
    }

    fn caption(&self, canvas: &mut RgbImage, x: i32, y: i32, scale: f32, color: Rgb<u8>, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(canvas, color, x, y, PxScale::from(scale), font, text);
        }
    }
}

/// Hollow rectangle with the given stroke thickness, growing inwards
fn draw_box(
    canvas: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgb<u8>,
    thickness: u32,
) {
    for inset in 0..thickness {
        let w = width.saturating_sub(2 * inset);
        let h = height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Encode `image` as `data:image/jpeg;base64,...`
pub fn encode_data_uri(image: &RgbImage, quality: u8) -> Result<String, image::ImageError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder.encode_image(image)?;
    }
    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&buffer)))
}
