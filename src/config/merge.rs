use std::env;
use std::path::PathBuf;

use super::utils::{parse_env, parse_env_bool};
use super::yaml::YamlConfig;
use super::{AuthApiSecret, DEFAULT_API_SECRET_ID, ServerConfig};
use crate::core::calibration::CalibrationScope;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// Passing `None` loads from environment variables and defaults only.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let defaults = ServerConfig::default();

    // Helper macro to get a string value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional string values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env::var($env_var).ok())
        };
    }

    // Helper macro for parsed values: YAML > ENV > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => parse_env($env_var)?.unwrap_or($default),
            }
        };
    }

    let server = yaml.server.unwrap_or_default();
    let auth = yaml.auth.unwrap_or_default();
    let detector = yaml.detector.unwrap_or_default();
    let overlay = yaml.overlay.unwrap_or_default();
    let calibration = yaml.calibration.unwrap_or_default();

    // Server configuration
    let host = get_value!("HOST", server.host, defaults.host);
    let port = get_parsed!("PORT", server.port, defaults.port);

    // Authentication configuration
    let auth_required = match auth.required {
        Some(required) => required,
        None => parse_env_bool("AUTH_REQUIRED")?.unwrap_or(defaults.auth_required),
    };

    let auth_api_secrets = if !auth.api_secrets.is_empty() {
        auth.api_secrets
    } else {
        get_optional!("AUTH_API_SECRET", auth.api_secret)
            .map(|secret| vec![AuthApiSecret::new(DEFAULT_API_SECRET_ID, secret)])
            .unwrap_or_default()
    };

    let auth_jwt_secret = get_optional!("AUTH_JWT_SECRET", auth.jwt_secret);

    // Face detector configuration
    let detector_model_path =
        get_optional!("DETECTOR_MODEL_PATH", detector.model_path).map(PathBuf::from);
    let detector_score_threshold = get_parsed!(
        "DETECTOR_SCORE_THRESHOLD",
        detector.score_threshold,
        defaults.detector_score_threshold
    );
    let detector_nms_threshold = get_parsed!(
        "DETECTOR_NMS_THRESHOLD",
        detector.nms_threshold,
        defaults.detector_nms_threshold
    );
    let detector_top_k = get_parsed!("DETECTOR_TOP_K", detector.top_k, defaults.detector_top_k);

    let overlay_font_path =
        get_optional!("OVERLAY_FONT_PATH", overlay.font_path).map(PathBuf::from);

    // Calibration configuration
    let calibration_scope = match get_optional!("CALIBRATION_SCOPE", calibration.scope) {
        Some(raw) => raw.parse::<CalibrationScope>()?,
        None => defaults.calibration_scope,
    };
    let frame_interval_ms = get_parsed!(
        "FRAME_INTERVAL_MS",
        calibration.frame_interval_ms,
        defaults.frame_interval_ms
    );
    let reference_distance_m = get_parsed!(
        "REFERENCE_DISTANCE_M",
        calibration.reference_distance_m,
        defaults.reference_distance_m
    );
    let target_distance_m = get_parsed!(
        "TARGET_DISTANCE_M",
        calibration.target_distance_m,
        defaults.target_distance_m
    );
    let target_tolerance_m = get_parsed!(
        "TARGET_TOLERANCE_M",
        calibration.target_tolerance_m,
        defaults.target_tolerance_m
    );

    Ok(ServerConfig {
        host,
        port,
        auth_required,
        auth_api_secrets,
        auth_jwt_secret,
        detector_model_path,
        detector_score_threshold,
        detector_nms_threshold,
        detector_top_k,
        overlay_font_path,
        calibration_scope,
        frame_interval_ms,
        reference_distance_m,
        target_distance_m,
        target_tolerance_m,
    })
}
