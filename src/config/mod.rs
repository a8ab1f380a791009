//! Configuration module for the acuity server
//!
//! Configuration comes from environment variables or from a YAML file merged
//! with environment variables. The loading steps are split into submodules.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use acuity::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file merged with environment variables
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::calibration::{CalibrationScope, MeasurementSettings};
use crate::core::distance::{
    DEFAULT_REFERENCE_DISTANCE_M, DEFAULT_TARGET_DISTANCE_M, DEFAULT_TARGET_TOLERANCE_M,
};

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Identifier used for an API secret given without an explicit id
pub const DEFAULT_API_SECRET_ID: &str = "default";

/// A named API secret accepted as a bearer token
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct AuthApiSecret {
    pub id: String,
    pub secret: String,
}

impl AuthApiSecret {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Authentication settings
    pub auth_required: bool,
    pub auth_api_secrets: Vec<AuthApiSecret>,
    pub auth_jwt_secret: Option<String>,

    // Face detector settings
    pub detector_model_path: Option<PathBuf>,
    pub detector_score_threshold: f32,
    pub detector_nms_threshold: f32,
    pub detector_top_k: usize,

    // Preview overlay
    pub overlay_font_path: Option<PathBuf>,

    // Calibration and measurement
    pub calibration_scope: CalibrationScope,
    pub frame_interval_ms: u64,
    pub reference_distance_m: f64,
    pub target_distance_m: f64,
    pub target_tolerance_m: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            auth_required: false,
            auth_api_secrets: Vec::new(),
            auth_jwt_secret: None,
            detector_model_path: None,
            detector_score_threshold: 0.4,
            detector_nms_threshold: 0.3,
            detector_top_k: 5000,
            overlay_font_path: None,
            calibration_scope: CalibrationScope::Shared,
            frame_interval_ms: 50,
            reference_distance_m: DEFAULT_REFERENCE_DISTANCE_M,
            target_distance_m: DEFAULT_TARGET_DISTANCE_M,
            target_tolerance_m: DEFAULT_TARGET_TOLERANCE_M,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file merged with environment variables
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The .env file is not loaded here: with an explicit config file only
        // real environment variables take part in the merge.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Run every validation rule against this configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_auth_required(
            self.auth_required,
            &self.auth_api_secrets,
            &self.auth_jwt_secret,
        )?;
        validation::validate_api_secrets(&self.auth_api_secrets)?;
        validation::validate_detector(
            self.detector_score_threshold,
            self.detector_nms_threshold,
            self.detector_top_k,
        )?;
        validation::validate_distances(
            self.reference_distance_m,
            self.target_distance_m,
            self.target_tolerance_m,
        )?;
        Ok(())
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if JWT authentication is configured
    pub fn has_jwt_auth(&self) -> bool {
        self.auth_jwt_secret.is_some()
    }

    /// Check if API secret authentication is configured
    pub fn has_api_secret_auth(&self) -> bool {
        !self.auth_api_secrets.is_empty()
    }

    pub fn measurement_settings(&self) -> MeasurementSettings {
        MeasurementSettings {
            reference_distance_m: self.reference_distance_m,
            target_distance_m: self.target_distance_m,
            target_tolerance_m: self.target_tolerance_m,
        }
    }

    /// Minimum interval between two processed frames of one session
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
