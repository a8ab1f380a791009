mod common;

use serde_json::json;

use acuity::{DetectedFace, ServerConfig, config::AuthApiSecret};
use common::{expect_close, frame_payload, next_json, send_json, send_text, spawn_server, test_config};

fn reference_face() -> DetectedFace {
    // 150 px wide at 0.7 m gives a 700 px focal length
    DetectedFace::new(100.0, 50.0, 150.0, 180.0, 0.9)
}

fn auth_config() -> ServerConfig {
    ServerConfig {
        auth_required: true,
        auth_api_secrets: vec![AuthApiSecret::new("kiosk", "s3cret")],
        ..test_config()
    }
}

#[tokio::test]
async fn test_calibrate_then_measure() {
    let server = spawn_server(test_config()).await;
    server.detector.set_faces(vec![reference_face()]);
    let mut ws = server.connect("/ws").await;

    send_json(&mut ws, json!({"command": "start_calibration"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Please stand at one-arm distance and click Capture"})
    );

    send_json(&mut ws, json!({"command": "capture", "image": frame_payload()})).await;
    let calibrated = next_json(&mut ws).await;
    assert_eq!(calibrated["success"], true);
    assert_eq!(calibrated["face_detected"], true);
    assert_eq!(calibrated["message"], "Calibration complete");
    let focal_length = calibrated["focal_length"].as_f64().unwrap();
    assert!((focal_length - 700.0).abs() < 1e-6);

    send_json(
        &mut ws,
        json!({"command": "start_distance", "focal_length": 700.0}),
    )
    .await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Distance measurement started with focal length: 700.0"})
    );

    // 0.15 m * 700 px / 26.25 px = 4.0 m
    server
        .detector
        .set_faces(vec![DetectedFace::new(140.0, 100.0, 26.25, 34.0, 0.8)]);
    send_json(&mut ws, json!({"image": frame_payload()})).await;
    let measured = next_json(&mut ws).await;
    assert_eq!(measured["success"], true);
    assert_eq!(measured["faces"][0]["distance"], 4.0);
    assert_eq!(measured["faces"][0]["confidence"], 0.8);
    assert_eq!(measured["at_target_distance"], true);
    assert_eq!(measured["reference_box"], json!({"width": 26, "height": 39}));
    assert!(
        measured["processed_image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,")
    );

    send_json(&mut ws, json!({"command": "stop_all"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Measurement stopped"})
    );
}

#[tokio::test]
async fn test_no_face_while_measuring_keeps_guide() {
    let server = spawn_server(test_config()).await;
    let mut ws = server.connect("/ws").await;

    send_json(
        &mut ws,
        json!({"command": "start_distance", "focal_length": 700.0}),
    )
    .await;
    next_json(&mut ws).await;

    send_json(&mut ws, json!({"command": "capture", "image": frame_payload()})).await;
    let response = next_json(&mut ws).await;
    assert_eq!(response["success"], false);
    assert_eq!(response["face_detected"], false);
    assert_eq!(response["message"], "No face detected");
    assert_eq!(response["reference_box"], json!({"width": 26, "height": 39}));
}

#[tokio::test]
async fn test_start_distance_requires_focal_length() {
    let server = spawn_server(test_config()).await;
    let mut ws = server.connect("/ws").await;

    send_json(&mut ws, json!({"command": "start_distance"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "No focal length provided. Please calibrate first."})
    );
}

#[tokio::test]
async fn test_streamed_frames_are_rate_limited() {
    let config = ServerConfig {
        frame_interval_ms: 60_000,
        ..test_config()
    };
    let server = spawn_server(config).await;
    server.detector.set_faces(vec![reference_face()]);
    let mut ws = server.connect("/ws").await;

    for _ in 0..3 {
        send_json(&mut ws, json!({"image": frame_payload()})).await;
    }
    send_json(&mut ws, json!({"command": "stop_all"})).await;

    // One frame result, then the acknowledgement
    let first = next_json(&mut ws).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "Face detected, but distance mode is off.");
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Measurement stopped"})
    );
}

#[tokio::test]
async fn test_protocol_errors_keep_session_open() {
    let server = spawn_server(test_config()).await;
    let mut ws = server.connect("/ws").await;

    send_text(&mut ws, "this is not json").await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Invalid message format"})
    );

    send_json(&mut ws, json!({"command": "jump"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Unknown command: jump"})
    );

    send_json(&mut ws, json!({"image": "data:image/jpeg;base64,@@@"})).await;
    let response = next_json(&mut ws).await;
    assert_eq!(response["success"], false);
    assert_eq!(response["error"], "Invalid image");

    send_json(&mut ws, json!({"command": "stop_all"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Measurement stopped"})
    );
}

#[tokio::test]
async fn test_missing_token_closes_with_policy_violation() {
    let server = spawn_server(auth_config()).await;
    let mut ws = server.connect("/ws").await;

    send_json(&mut ws, json!({"command": "start_calibration"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Authentication token required"})
    );
    assert_eq!(expect_close(&mut ws).await, 1008);
}

#[tokio::test]
async fn test_invalid_token_closes_with_policy_violation() {
    let server = spawn_server(auth_config()).await;
    let mut ws = server.connect("/ws").await;

    send_json(&mut ws, json!({"token": "guess"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Invalid authentication token"})
    );
    assert_eq!(expect_close(&mut ws).await, 1008);
}

#[tokio::test]
async fn test_valid_token_greets_client() {
    let server = spawn_server(auth_config()).await;
    let mut ws = server.connect("/ws").await;

    send_json(&mut ws, json!({"token": "s3cret"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Authenticated successfully as kiosk"})
    );

    send_json(&mut ws, json!({"command": "start_calibration"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Please stand at one-arm distance and click Capture"})
    );
}

#[tokio::test]
async fn test_calibration_channel() {
    let server = spawn_server(auth_config()).await;
    server.detector.set_faces(vec![reference_face()]);
    let mut ws = server.connect("/ws/calibration").await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"message": "Connected to calibration service"})
    );

    send_json(&mut ws, json!({"command": "start_distance", "focal_length": 700.0})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Command not available on this channel: start_distance"})
    );

    send_json(&mut ws, json!({"command": "start_calibration"})).await;
    next_json(&mut ws).await;
    send_json(&mut ws, json!({"command": "capture", "image": frame_payload()})).await;
    let calibrated = next_json(&mut ws).await;
    assert_eq!(calibrated["message"], "Calibration complete");
}

#[tokio::test]
async fn test_shared_scope_is_visible_across_connections() {
    let server = spawn_server(test_config()).await;
    server.detector.set_faces(vec![reference_face()]);
    let mut first = server.connect("/ws").await;
    let mut second = server.connect("/ws").await;

    send_json(&mut first, json!({"command": "start_calibration"})).await;
    next_json(&mut first).await;

    // The other connection's frame completes the shared calibration
    send_json(&mut second, json!({"command": "capture", "image": frame_payload()})).await;
    assert_eq!(next_json(&mut second).await["message"], "Calibration complete");
}

#[tokio::test]
async fn test_session_scope_isolates_connections() {
    let config = ServerConfig {
        calibration_scope: acuity::CalibrationScope::Session,
        ..test_config()
    };
    let server = spawn_server(config).await;
    server.detector.set_faces(vec![reference_face()]);
    let mut first = server.connect("/ws").await;
    let mut second = server.connect("/ws").await;

    send_json(&mut first, json!({"command": "start_calibration"})).await;
    next_json(&mut first).await;

    send_json(&mut second, json!({"command": "capture", "image": frame_payload()})).await;
    assert_eq!(
        next_json(&mut second).await["message"],
        "Face detected, but distance mode is off."
    );
}
