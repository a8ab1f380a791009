use serde::Deserialize;
use std::path::PathBuf;

use super::AuthApiSecret;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8000
///
/// auth:
///   required: true
///   api_secrets:
///     - id: "kiosk-1"
///       secret: "kiosk-secret"
///   jwt_secret: "hs256-signing-secret"
///
/// detector:
///   model_path: "models/face_detection_yunet_2023mar.onnx"
///   score_threshold: 0.4
///   nms_threshold: 0.3
///   top_k: 5000
///
/// overlay:
///   font_path: "assets/DejaVuSans.ttf"
///
/// calibration:
///   scope: "shared"
///   frame_interval_ms: 50
///   reference_distance_m: 0.7
///   target_distance_m: 4.0
///   target_tolerance_m: 0.2
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub auth: Option<AuthYaml>,
    pub detector: Option<DetectorYaml>,
    pub overlay: Option<OverlayYaml>,
    pub calibration: Option<CalibrationYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Authentication configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthYaml {
    pub required: Option<bool>,
    /// Single secret, registered under the id "default"
    pub api_secret: Option<String>,
    pub api_secrets: Vec<AuthApiSecret>,
    pub jwt_secret: Option<String>,
}

/// Face detector configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DetectorYaml {
    pub model_path: Option<String>,
    pub score_threshold: Option<f32>,
    pub nms_threshold: Option<f32>,
    pub top_k: Option<usize>,
}

/// Preview overlay configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OverlayYaml {
    pub font_path: Option<String>,
}

/// Calibration configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationYaml {
    pub scope: Option<String>,
    pub frame_interval_ms: Option<u64>,
    pub reference_distance_m: Option<f64>,
    pub target_distance_m: Option<f64>,
    pub target_tolerance_m: Option<f64>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is malformed or
    /// fields have invalid types.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
