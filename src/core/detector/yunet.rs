//! YuNet face detector running on ONNX Runtime.
//!
//! The model takes a `[1, 3, H, W]` BGR float tensor (no normalization) with
//! `H` and `W` padded to multiples of 32, and produces per-stride heads
//! `cls_{s}`, `obj_{s}` and `bbox_{s}` for strides 8, 16 and 32.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::{DynValue, Tensor};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{DetectedFace, DetectorError, FaceDetector};

const STRIDES: [u32; 3] = [8, 16, 32];

/// Input dimensions must be multiples of the largest stride
const PAD_MULTIPLE: u32 = 32;

/// YuNet detector configuration
#[derive(Debug, Clone)]
pub struct YuNetConfig {
    pub model_path: PathBuf,
    /// Minimum score for a candidate box
    pub score_threshold: f32,
    /// IoU threshold for non-maximum suppression
    pub nms_threshold: f32,
    /// Maximum number of candidates kept before NMS
    pub top_k: usize,
}

impl YuNetConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            score_threshold: 0.4,
            nms_threshold: 0.3,
            top_k: 5000,
        }
    }
}

pub struct YuNetDetector {
    session: Mutex<Session>,
    config: YuNetConfig,
}

impl YuNetDetector {
    /// Load the ONNX model. Fails if the file is missing or malformed.
    pub fn load(config: YuNetConfig) -> Result<Self> {
        if !config.model_path.exists() {
            anyhow::bail!(
                "Face detector model not found at {}",
                config.model_path.display()
            );
        }

        info!("Loading YuNet ONNX model from: {:?}", config.model_path);
        let session = Self::create_session(&config.model_path)?;

        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    fn create_session(model_path: &Path) -> Result<Session> {
        let session = SessionBuilder::new()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)
            .context("Failed to load YuNet ONNX model")?;

        for (i, input) in session.inputs.iter().enumerate() {
            debug!("  Input {}: name={}", i, input.name);
        }
        for (i, output) in session.outputs.iter().enumerate() {
            debug!("  Output {}: name={}", i, output.name);
        }

        if session.inputs.is_empty() {
            anyhow::bail!("YuNet model has no inputs");
        }

        Ok(session)
    }

    /// Build the padded BGR NCHW tensor data
    fn preprocess(frame: &RgbImage, padded_w: u32, padded_h: u32) -> Vec<f32> {
        let plane = (padded_w * padded_h) as usize;
        let mut data = vec![0.0f32; plane * 3];

        for (x, y, pixel) in frame.enumerate_pixels() {
            if x >= padded_w || y >= padded_h {
                continue;
            }
            let idx = (y * padded_w + x) as usize;
            let [r, g, b] = pixel.0;
            data[idx] = f32::from(b);
            data[plane + idx] = f32::from(g);
            data[2 * plane + idx] = f32::from(r);
        }

        data
    }

    fn run(&self, frame: &RgbImage, input_size: (u32, u32)) -> Result<Vec<DetectedFace>> {
        let padded_w = pad_to_multiple(input_size.0.max(1));
        let padded_h = pad_to_multiple(input_size.1.max(1));
        let data = Self::preprocess(frame, padded_w, padded_h);

        let input_name = {
            let session = self.session.lock();
            session.inputs[0].name.clone()
        };

        let input_value = Tensor::from_array(([1, 3, padded_h as usize, padded_w as usize], data))
            .context("Failed to create input tensor")?
            .into_dyn();
        let inputs: Vec<(&str, DynValue)> = vec![(input_name.as_str(), input_value)];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .context("Failed to run YuNet inference")?;

        let mut candidates = Vec::new();
        for stride in STRIDES {
            let cols = padded_w / stride;
            let rows = padded_h / stride;

            let (_, cls) = outputs
                .get(format!("cls_{stride}").as_str())
                .with_context(|| format!("No 'cls_{stride}' tensor in YuNet results"))?
                .try_extract_tensor::<f32>()
                .context("Failed to extract cls tensor")?;
            let (_, obj) = outputs
                .get(format!("obj_{stride}").as_str())
                .with_context(|| format!("No 'obj_{stride}' tensor in YuNet results"))?
                .try_extract_tensor::<f32>()
                .context("Failed to extract obj tensor")?;
            let (_, bbox) = outputs
                .get(format!("bbox_{stride}").as_str())
                .with_context(|| format!("No 'bbox_{stride}' tensor in YuNet results"))?
                .try_extract_tensor::<f32>()
                .context("Failed to extract bbox tensor")?;

            decode_stride(
                StrideHead {
                    stride,
                    rows,
                    cols,
                    cls,
                    obj,
                    bbox,
                },
                self.config.score_threshold,
                &mut candidates,
            );
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates.truncate(self.config.top_k);

        Ok(non_maximum_suppression(candidates, self.config.nms_threshold))
    }
}

impl FaceDetector for YuNetDetector {
    fn detect(
        &self,
        frame: &RgbImage,
        input_size: (u32, u32),
    ) -> Result<Vec<DetectedFace>, DetectorError> {
        self.run(frame, input_size)
            .map_err(|e| DetectorError::Inference(format!("{e:#}")))
    }

    fn name(&self) -> &str {
        "yunet"
    }
}

struct StrideHead<'a> {
    stride: u32,
    rows: u32,
    cols: u32,
    cls: &'a [f32],
    obj: &'a [f32],
    bbox: &'a [f32],
}

fn decode_stride(head: StrideHead<'_>, score_threshold: f32, out: &mut Vec<DetectedFace>) {
    let stride = head.stride as f32;
    let cells = (head.rows * head.cols) as usize;
    if head.cls.len() < cells || head.obj.len() < cells || head.bbox.len() < cells * 4 {
        return;
    }

    for r in 0..head.rows {
        for c in 0..head.cols {
            let idx = (r * head.cols + c) as usize;
            let cls_score = head.cls[idx].clamp(0.0, 1.0);
            let obj_score = head.obj[idx].clamp(0.0, 1.0);
            let score = (cls_score * obj_score).sqrt();
            if score < score_threshold {
                continue;
            }

            let cx = (c as f32 + head.bbox[idx * 4]) * stride;
            let cy = (r as f32 + head.bbox[idx * 4 + 1]) * stride;
            let w = head.bbox[idx * 4 + 2].exp() * stride;
            let h = head.bbox[idx * 4 + 3].exp() * stride;

            out.push(DetectedFace::new(cx - w / 2.0, cy - h / 2.0, w, h, score));
        }
    }
}

fn pad_to_multiple(value: u32) -> u32 {
    value.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE
}

fn iou(a: &DetectedFace, b: &DetectedFace) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 { 0.0 } else { intersection / union }
}

/// Greedy NMS over candidates already sorted by descending confidence
fn non_maximum_suppression(boxes: Vec<DetectedFace>, iou_threshold: f32) -> Vec<DetectedFace> {
    let mut kept: Vec<DetectedFace> = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        kept.push(boxes[i]);
        for j in (i + 1)..boxes.len() {
            if iou(&boxes[i], &boxes[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    kept
}
