use std::collections::HashSet;

use super::AuthApiSecret;

/// Validate that when auth is required, at least one auth method is configured
pub fn validate_auth_required(
    auth_required: bool,
    auth_api_secrets: &[AuthApiSecret],
    auth_jwt_secret: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !auth_required {
        return Ok(());
    }

    if auth_api_secrets.is_empty() && auth_jwt_secret.is_none() {
        return Err(
            "When AUTH_REQUIRED=true, either AUTH_API_SECRET or AUTH_JWT_SECRET must be configured"
                .into(),
        );
    }

    Ok(())
}

/// Validate API secret entries: non-empty values and unique ids
pub fn validate_api_secrets(secrets: &[AuthApiSecret]) -> Result<(), Box<dyn std::error::Error>> {
    let mut ids = HashSet::new();
    for entry in secrets {
        if entry.id.trim().is_empty() {
            return Err("API secret id cannot be empty".into());
        }
        if entry.secret.is_empty() {
            return Err(format!("API secret '{}' has an empty value", entry.id).into());
        }
        if !ids.insert(entry.id.as_str()) {
            return Err(format!("Duplicate API secret id: {}", entry.id).into());
        }
    }
    Ok(())
}

/// Validate detector thresholds
pub fn validate_detector(
    score_threshold: f32,
    nms_threshold: f32,
    top_k: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&score_threshold) {
        return Err(format!(
            "DETECTOR_SCORE_THRESHOLD must be between 0 and 1, got {score_threshold}"
        )
        .into());
    }
    if !(0.0..=1.0).contains(&nms_threshold) {
        return Err(
            format!("DETECTOR_NMS_THRESHOLD must be between 0 and 1, got {nms_threshold}").into(),
        );
    }
    if top_k == 0 {
        return Err("DETECTOR_TOP_K must be at least 1".into());
    }
    Ok(())
}

/// Validate calibration and target distances
pub fn validate_distances(
    reference_distance_m: f64,
    target_distance_m: f64,
    target_tolerance_m: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    if !reference_distance_m.is_finite() || reference_distance_m <= 0.0 {
        return Err(format!(
            "REFERENCE_DISTANCE_M must be a positive number, got {reference_distance_m}"
        )
        .into());
    }
    if !target_distance_m.is_finite() || target_distance_m <= 0.0 {
        return Err(format!(
            "TARGET_DISTANCE_M must be a positive number, got {target_distance_m}"
        )
        .into());
    }
    if !target_tolerance_m.is_finite() || target_tolerance_m < 0.0 {
        return Err(format!(
            "TARGET_TOLERANCE_M must be zero or positive, got {target_tolerance_m}"
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_not_required_passes() {
        assert!(validate_auth_required(false, &[], &None).is_ok());
    }

    #[test]
    fn test_auth_required_without_method_fails() {
        let err = validate_auth_required(true, &[], &None).unwrap_err();
        assert!(err.to_string().contains("AUTH_REQUIRED=true"));
    }

    #[test]
    fn test_auth_required_with_either_method_passes() {
        let secrets = vec![AuthApiSecret::new("default", "secret")];
        assert!(validate_auth_required(true, &secrets, &None).is_ok());
        assert!(validate_auth_required(true, &[], &Some("jwt".to_string())).is_ok());
    }

    #[test]
    fn test_api_secrets_rejects_duplicates_and_empty() {
        let duplicate = vec![
            AuthApiSecret::new("a", "one"),
            AuthApiSecret::new("a", "two"),
        ];
        assert!(validate_api_secrets(&duplicate).is_err());
        assert!(validate_api_secrets(&[AuthApiSecret::new("a", "")]).is_err());
        assert!(validate_api_secrets(&[AuthApiSecret::new(" ", "x")]).is_err());
        assert!(validate_api_secrets(&[AuthApiSecret::new("a", "x")]).is_ok());
    }

    #[test]
    fn test_detector_thresholds() {
        assert!(validate_detector(0.4, 0.3, 5000).is_ok());
        assert!(validate_detector(1.5, 0.3, 5000).is_err());
        assert!(validate_detector(0.4, -0.1, 5000).is_err());
        assert!(validate_detector(f32::NAN, 0.3, 5000).is_err());
        assert!(validate_detector(0.4, 0.3, 0).is_err());
    }

    #[test]
    fn test_distances() {
        assert!(validate_distances(0.7, 4.0, 0.2).is_ok());
        assert!(validate_distances(0.7, 4.0, 0.0).is_ok());
        assert!(validate_distances(0.0, 4.0, 0.2).is_err());
        assert!(validate_distances(0.7, f64::INFINITY, 0.2).is_err());
        assert!(validate_distances(0.7, 4.0, -0.1).is_err());
    }
}
