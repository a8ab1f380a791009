#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use futures::{SinkExt, StreamExt};
use image::{ImageFormat, RgbImage};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message};

use acuity::{
    DetectedFace, DetectorError, FaceDetector, ServerConfig, routes, state::AppState,
};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Detector returning whatever faces the test last set
#[derive(Default)]
pub struct ScriptedDetector {
    faces: Mutex<Vec<DetectedFace>>,
}

impl ScriptedDetector {
    pub fn set_faces(&self, faces: Vec<DetectedFace>) {
        *self.faces.lock() = faces;
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&self, _: &RgbImage, _: (u32, u32)) -> Result<Vec<DetectedFace>, DetectorError> {
        Ok(self.faces.lock().clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub detector: Arc<ScriptedDetector>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub async fn connect(&self, path: &str) -> WsStream {
        let (ws_stream, _) = connect_async(self.url(path))
            .await
            .expect("Failed to connect");
        ws_stream
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

/// Start a server on an ephemeral port
pub async fn spawn_server(config: ServerConfig) -> TestServer {
    let detector = Arc::new(ScriptedDetector::default());
    let app_state = AppState::with_detector(config, detector.clone());
    let app = routes::create_app(app_state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { addr, detector }
}

pub fn frame_payload() -> String {
    let mut bytes = Vec::new();
    RgbImage::new(320, 240)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

pub async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

pub async fn send_text(ws: &mut WsStream, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

/// Next WebSocket message, failing the test after a few seconds
pub async fn next_message(ws: &mut WsStream) -> Message {
    tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Timed out waiting for a message")
        .expect("Connection ended")
        .expect("WebSocket error")
}

pub async fn next_json(ws: &mut WsStream) -> Value {
    match next_message(ws).await {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("Expected text message, got {other:?}"),
    }
}

/// Wait for a close frame and return its code
pub async fn expect_close(ws: &mut WsStream) -> u16 {
    match next_message(ws).await {
        Message::Close(Some(frame)) => u16::from(frame.code),
        other => panic!("Expected close frame, got {other:?}"),
    }
}
