//! GeminiClient のHTTPテスト
//!
//! axum のモックサーバーに固定のレスポンスを返させ、
//! リクエスト内容とレスポンス処理を検証する。

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use flower_ai_rust::analyzer::{GeminiClient, ImageAnalyzer};
use flower_ai_rust::error::FlowerAiError;
use flower_ai_rust::scanner::ImageFile;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// 受信したリクエスト
#[derive(Clone)]
struct CapturedRequest {
    /// `models/` 以降のパス（`<model>:generateContent`）
    call: String,
    api_key: Option<String>,
    body: String,
}

/// 固定のステータスと本文を返すモック
#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    captured: Arc<Mutex<Option<CapturedRequest>>>,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.captured.lock().unwrap() = Some(CapturedRequest { call, api_key, body });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// モックサーバーを起動して API ベースURLを返す
async fn mock_server(
    status: StatusCode,
    body: String,
) -> (String, Arc<Mutex<Option<CapturedRequest>>>) {
    let captured = Arc::new(Mutex::new(None));
    let state = MockState {
        status,
        body,
        captured: Arc::clone(&captured),
    };
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate_content))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1beta/models", addr), captured)
}

fn captured_request(captured: &Arc<Mutex<Option<CapturedRequest>>>) -> CapturedRequest {
    captured
        .lock()
        .unwrap()
        .clone()
        .expect("リクエストが届いていない")
}

fn candidate_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn client(api_base: &str) -> GeminiClient {
    GeminiClient::new("test-key", "gemini-2.5-flash")
        .unwrap()
        .with_api_base(api_base)
}

fn rose() -> ImageFile {
    ImageFile::from_bytes("rose.jpg", "image/jpeg", b"abc".to_vec())
}

/// 正常応答: リクエスト形式と結果の正規化
#[tokio::test]
async fn test_analyze_success() {
    let text = r#"{"flowerName": "Rose", "geographicArea": "Central Asia", "confidence": 92}"#;
    let (base, captured) = mock_server(StatusCode::OK, candidate_body(text)).await;

    let result = client(&base).analyze(&rose()).await.unwrap();

    assert_eq!(result.file_name, "rose.jpg");
    assert_eq!(result.flower_name, "Rose");
    assert_eq!(result.geographic_area, "Central Asia");
    assert_eq!(result.confidence, 92.0);

    let request = captured_request(&captured);
    assert_eq!(request.call, "gemini-2.5-flash:generateContent");
    assert_eq!(request.api_key.as_deref(), Some("test-key"));

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
    assert_eq!(parts[0]["inline_data"]["data"], "YWJj");
    assert!(parts[1]["text"].as_str().unwrap().contains("flower"));
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
}

/// 欠損フィールドはデフォルト値で補う
#[tokio::test]
async fn test_analyze_partial_response() {
    let (base, _captured) = mock_server(StatusCode::OK, candidate_body(r#"{"flowerName": "Lily"}"#)).await;

    let result = client(&base).analyze(&rose()).await.unwrap();
    assert_eq!(result.flower_name, "Lily");
    assert_eq!(result.geographic_area, "Unknown");
    assert_eq!(result.confidence, 0.0);
}

/// HTTPエラーはメッセージ付きの ApiCall
#[tokio::test]
async fn test_analyze_http_error() {
    let body = json!({
        "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
    })
    .to_string();
    let (base, _captured) = mock_server(StatusCode::BAD_REQUEST, body).await;

    let err = client(&base).analyze(&rose()).await.unwrap_err();
    match err {
        FlowerAiError::ApiCall(message) => {
            assert!(message.contains("400"));
            assert!(message.contains("API key not valid."));
            assert!(!message.contains("test-key"));
        }
        other => panic!("ApiCallを期待: {:?}", other),
    }
}

/// テキストの無い応答
#[tokio::test]
async fn test_analyze_empty_candidates() {
    let (base, _captured) = mock_server(StatusCode::OK, r#"{"candidates": []}"#.to_string()).await;

    let err = client(&base).analyze(&rose()).await.unwrap_err();
    match err {
        FlowerAiError::ApiParse(message) => assert_eq!(message, "No response text from Gemini"),
        other => panic!("ApiParseを期待: {:?}", other),
    }
}

/// JSONとして読めない応答テキスト
#[tokio::test]
async fn test_analyze_unparseable_text() {
    let (base, _captured) = mock_server(StatusCode::OK, candidate_body("I cannot identify this.")).await;

    let err = client(&base).analyze(&rose()).await.unwrap_err();
    assert!(matches!(err, FlowerAiError::ApiParse(_)));
}

/// 読めないファイルはリクエスト前に IO エラー
#[tokio::test]
async fn test_analyze_unreadable_file() {
    let (base, captured) = mock_server(StatusCode::OK, candidate_body("{}")).await;
    let dir = tempfile::tempdir().unwrap();
    let missing = ImageFile::from_path(&dir.path().join("gone.jpg"));

    let err = client(&base).analyze(&missing).await.unwrap_err();
    assert!(matches!(err, FlowerAiError::Io(_)));
    assert!(captured.lock().unwrap().is_none());
}
