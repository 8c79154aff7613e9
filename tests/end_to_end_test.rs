//! End-to-end: file on disk -> ingestion -> Gemini client (stubbed) -> session.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, Router};
use secrecy::Secret;
use serde_json::{json, Value};

use shopseeker_controller::{AppStatus, SearchController, SessionState};
use shopseeker_core::config::{AppConfig, LocationSource};
use shopseeker_gateway::{ImageIngestor, LocationHandle};

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn handle(State(stub): State<Stub>, body: String) -> (StatusCode, axum::Json<Value>) {
    stub.requests
        .lock()
        .unwrap()
        .push(serde_json::from_str(&body).unwrap_or(Value::Null));
    (stub.status, axum::Json(stub.reply.clone()))
}

async fn spawn_gemini(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(handle).with_state(Stub {
        status,
        reply,
        requests: requests.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), requests)
}

fn config_for(endpoint: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.analysis.endpoint = endpoint.to_string();
    config.analysis.api_key = Some(Secret::new("e2e-key".to_string()));
    config
}

/// A small PNG written under a misleading extension.
fn write_png(path: &Path) {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([30, 60, 200]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    std::fs::write(path, buf.into_inner()).unwrap();
}

fn controller_for(config: &AppConfig, location: LocationHandle) -> SearchController {
    let client = shopseeker_model_gateway::create_client_from_config(&config.analysis).unwrap();
    SearchController::builder()
        .with_analyzer(Arc::new(client))
        .with_location(location)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_photo_to_nearby_shops() {
    let reply = json!({
        "candidates": [{
            "content": {"parts": [
                {"text": "Thinking about glaze...", "thought": true},
                {"text": "A blue ceramic mug"}
            ]},
            "groundingMetadata": {"groundingChunks": [
                {"web": {"uri": "https://blog.example/mugs", "title": "Mug blog"}},
                {"maps": {
                    "title": "Corner Pottery",
                    "uri": "https://example.com/shop",
                    "placeAnswerSources": {"reviewSnippets": ["Lovely handmade mugs"]}
                }}
            ]}
        }]
    });
    let (endpoint, requests) = spawn_gemini(StatusCode::OK, reply).await;

    let mut config = config_for(&endpoint);
    config.location.provider = LocationSource::Fixed;
    config.location.latitude = Some(40.7128);
    config.location.longitude = Some(-74.006);

    let location = LocationHandle::start(&config.location, None).unwrap();
    assert!(location.resolved().await.is_some());
    let mut controller = controller_for(&config, location);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mug.jpg");
    write_png(&path);

    let image = ImageIngestor::from_config(&config.ingest)
        .ingest_file(&path)
        .await
        .unwrap();
    assert_eq!(image.media_type(), "image/png");

    controller.select_image(image.clone());
    let state = controller.search().await.clone();

    let SessionState::Success { result, .. } = state else {
        panic!("expected success, got {:?}", state);
    };
    assert_eq!(result.description, "A blue ceramic mug");
    assert_eq!(result.shops.len(), 1);
    assert_eq!(result.shops[0].title, "Corner Pottery");
    assert_eq!(result.shops[0].snippet.as_deref(), Some("Lovely handmade mugs"));

    let sent = requests.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    let parts = &sent[0]["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], image.data());
    assert_eq!(
        sent[0]["toolConfig"]["retrievalConfig"]["latLng"],
        json!({"latitude": 40.7128, "longitude": -74.006})
    );
}

#[tokio::test]
async fn test_rejected_request_then_try_again() {
    let reply = json!({"error": {"code": 400, "message": "Unsupported image.", "status": "INVALID_ARGUMENT"}});
    let (endpoint, requests) = spawn_gemini(StatusCode::BAD_REQUEST, reply).await;
    let config = config_for(&endpoint);

    let location = LocationHandle::start(&config.location, None).unwrap();
    assert!(!location.is_active());
    let mut controller = controller_for(&config, location);

    let image = ImageIngestor::from_config(&config.ingest)
        .ingest_bytes(b"\x89PNG\r\n\x1a\nnot-really", None)
        .unwrap();

    controller.select_image(image);
    let state = controller.search().await;
    assert_eq!(state.error(), Some("Unsupported image."));

    // Nothing is re-sent until the user starts over.
    controller.search().await;
    assert_eq!(requests.lock().unwrap().len(), 1);
    assert!(requests.lock().unwrap()[0].get("toolConfig").is_none());

    controller.reset();
    assert_eq!(controller.status(), AppStatus::Idle);
    assert!(controller.state().image().is_none());
}
