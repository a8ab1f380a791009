mod common;

use serde_json::json;

use acuity::{ServerConfig, config::AuthApiSecret};
use common::{expect_close, next_json, send_json, spawn_server, test_config};

fn auth_config() -> ServerConfig {
    ServerConfig {
        auth_required: true,
        auth_api_secrets: vec![AuthApiSecret::new("kiosk", "s3cret")],
        ..test_config()
    }
}

#[tokio::test]
async fn test_query_token_and_answers() {
    let server = spawn_server(auth_config()).await;
    let mut ws = server.connect("/ws_voice?token=s3cret").await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "authenticated", "user": "kiosk"})
    );

    send_json(&mut ws, json!({"command": "prepare_voice_model"})).await;
    assert_eq!(next_json(&mut ws).await, json!({"status": "ready_for_test"}));

    send_json(&mut ws, json!({"command": "START_SYMBOL", "orientation": "up"})).await;
    send_json(&mut ws, json!({"command": "VOICE_INPUT", "text": "bottom"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "INCORRECT", "text": "bottom"})
    );

    send_json(&mut ws, json!({"command": "VOICE_INPUT", "text": "wait a second"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "PAUSE_REQUESTED", "text": "wait a second"})
    );

    send_json(&mut ws, json!({"command": "VOICE_INPUT", "text": "Go up!"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "CORRECT", "text": "Go up!"})
    );

    send_json(&mut ws, json!({"command": "NEXT_SYMBOL", "orientation": "RIGHT"})).await;
    send_json(&mut ws, json!({"command": "VOICE_INPUT", "text": "purple"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "UNRECOGNIZED", "text": "purple"})
    );
}

#[tokio::test]
async fn test_first_message_token() {
    let server = spawn_server(auth_config()).await;
    let mut ws = server.connect("/ws_voice").await;

    send_json(&mut ws, json!({"token": "s3cret"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "authenticated", "user": "kiosk"})
    );
}

#[tokio::test]
async fn test_invalid_query_token_closes() {
    let server = spawn_server(auth_config()).await;
    let mut ws = server.connect("/ws_voice?token=nope").await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Invalid authentication token"})
    );
    assert_eq!(expect_close(&mut ws).await, 1008);
}

#[tokio::test]
async fn test_auth_disabled_is_anonymous() {
    let server = spawn_server(test_config()).await;
    let mut ws = server.connect("/ws_voice").await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"status": "authenticated", "user": "anonymous"})
    );

    // A direction with nothing expected is ignored; the next reply answers the unknown command
    send_json(&mut ws, json!({"command": "VOICE_INPUT", "text": "left"})).await;
    send_json(&mut ws, json!({"command": "DANCE"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"error": "Unknown command: DANCE"})
    );
}
