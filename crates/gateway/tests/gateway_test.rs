use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use concierge_core::config::{ProviderConfig, SpeechConfig};
use concierge_core::mocks::{MockIntentClassifier, MockSpeechToText};
use concierge_core::traits::SpeechToText;
use concierge_core::types::AudioInput;
use concierge_gateway::{
    AuthState, ChatPipeline, DefaultIntentHandler, GatewayConfig, GatewayServer,
    KeywordIntentClassifier, RegexEntityExtractor, TemplateClarifier, WhisperTranscriber,
};
use concierge_governance::{JwtAuthenticator, RoleGuard};
use concierge_provider::ProviderClient;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::Secret;
use serde_json::{json, Value};
use tower::ServiceExt;

const JWT_SECRET: &[u8] = b"gateway-test-secret";
const WAV_HEADER: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt ";
/// Any token passes the default no-op authenticator.
const DEV_BEARER: &str = "Bearer dev-token";

// =============================================================================
// Mock provider
// =============================================================================

#[derive(Default)]
struct Seen {
    auth: Vec<Option<String>>,
    bodies: Vec<Value>,
}

type Shared = Arc<Mutex<Seen>>;

fn remember(seen: &Shared, headers: &HeaderMap, body: Value) {
    let mut seen = seen.lock().unwrap();
    seen.auth.push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    seen.bodies.push(body);
}

async fn provider_create_chat(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let agent_id = body["agent_id"].as_str().unwrap_or_default().to_string();
    remember(&seen, &headers, body);
    match agent_id.as_str() {
        "agent_html" => (StatusCode::CREATED, "<html>created</html>").into_response(),
        "agent_unknown" => (StatusCode::UNPROCESSABLE_ENTITY, "unknown agent").into_response(),
        _ => (
            StatusCode::CREATED,
            Json(json!({"chat_id": "chat_123", "chat_status": "ongoing"})),
        )
            .into_response(),
    }
}

async fn provider_completion(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    remember(&seen, &headers, body);
    (StatusCode::INTERNAL_SERVER_ERROR, "agent crashed")
}

async fn provider_list() -> impl IntoResponse {
    Json(json!([{"chat_id": "chat_1"}, {"chat_id": "chat_2"}]))
}

async fn provider_get(Path(chat_id): Path<String>) -> impl IntoResponse {
    if chat_id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response();
    }
    Json(json!({"chat_id": chat_id, "chat_status": "ended"})).into_response()
}

async fn provider_end(Path(_chat_id): Path<String>) -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn start_mock_provider() -> (String, Shared) {
    let seen: Shared = Arc::default();
    let app = Router::new()
        .route("/create-chat", post(provider_create_chat))
        .route("/create-chat-completion", post(provider_completion))
        .route("/list-chat", get(provider_list))
        .route("/get-chat/:chat_id", get(provider_get))
        .route("/end-chat/:chat_id", patch(provider_end))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), seen)
}

/// A base URL nothing listens on.
async fn dead_provider_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// =============================================================================
// Helpers
// =============================================================================

fn default_pipeline(speech: Arc<dyn SpeechToText>) -> ChatPipeline {
    ChatPipeline::new(
        speech,
        Arc::new(KeywordIntentClassifier::default()),
        Arc::new(RegexEntityExtractor::default()),
        Arc::new(DefaultIntentHandler::default()),
        Arc::new(TemplateClarifier),
    )
}

fn app_with(pipeline: ChatPipeline, provider_url: &str) -> Router {
    let provider = ProviderClient::new(ProviderConfig::new(provider_url, "retell-key"));
    GatewayServer::new(GatewayConfig::default(), pipeline, provider).build_router()
}

fn app(provider_url: &str) -> Router {
    app_with(
        default_pipeline(Arc::new(MockSpeechToText::new("I want to book a room"))),
        provider_url,
    )
}

fn jwt_app(provider_url: &str) -> Router {
    let provider = ProviderClient::new(ProviderConfig::new(provider_url, "retell-key"));
    let auth = AuthState::new(
        Arc::new(JwtAuthenticator::new(JWT_SECRET)),
        RoleGuard::new(vec!["guest".into(), "hotel_staff".into()]),
    );
    GatewayServer::new(
        GatewayConfig::default(),
        default_pipeline(Arc::new(MockSpeechToText::new("hello"))),
        provider,
    )
    .with_auth(auth)
    .build_router()
}

fn token(role: &str) -> String {
    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
    encode(
        &Header::default(),
        &json!({"user_id": 7, "role": role, "exp": exp}),
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", DEV_BEARER)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// =============================================================================
// Health and routing
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(
        app("http://127.0.0.1:1"),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_wrong_method_is_bad_request() {
    let app = app("http://127.0.0.1:1");

    for uri in [
        "/api/voice-chat/",
        "/api/create-chat/",
        "/api/create-chat-completion/",
        "/api/end-chat/chat_1/",
    ] {
        let (status, body) = send(
            app.clone(),
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body, json!({"error": "POST request required"}));
    }

    let (status, body) = send(
        app,
        Request::builder()
            .method("DELETE")
            .uri("/api/list-chats/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "GET request required"}));
}

#[tokio::test]
async fn test_routes_mount_at_root_prefix() {
    let provider = ProviderClient::new(ProviderConfig::new("http://127.0.0.1:1", "k"));
    let config = GatewayConfig {
        api_prefix: "/".into(),
        ..GatewayConfig::default()
    };
    let app = GatewayServer::new(
        config,
        default_pipeline(Arc::new(MockSpeechToText::new(""))),
        provider,
    )
    .build_router();

    let (status, body) = send(app, json_request("POST", "/voice-chat/", json!({"text": "hi"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "greeting");
}

// =============================================================================
// voice-chat/
// =============================================================================

#[tokio::test]
async fn test_voice_chat_text_input() {
    let (status, body) = send(
        app("http://127.0.0.1:1"),
        json_request(
            "POST",
            "/api/voice-chat/",
            json!({"text": "Please book a room for tomorrow"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcription"], "Please book a room for tomorrow");
    assert_eq!(body["intent"], "book_room");
    assert_eq!(body["action"], "open_room_booking");
    assert_eq!(body["entities"]["date"], "tomorrow");
    assert!(body["answer"].as_str().unwrap().contains("tomorrow"));

    let confidence = body["confidence"].as_f64().unwrap();
    assert!(confidence > 0.0 && confidence < 1.0);
    assert_eq!((confidence * 100.0).round() / 100.0, confidence);
}

#[tokio::test]
async fn test_voice_chat_unknown_text_is_clarified() {
    let (status, body) = send(
        app("http://127.0.0.1:1"),
        json_request("POST", "/api/voice-chat/", json!({"text": "Purple Elephants"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "unknown");
    assert_eq!(body["confidence"], 0.0);
    assert!(body["action"].is_null());
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .contains("\"purple elephants\""));
}

#[tokio::test]
async fn test_voice_chat_without_input() {
    let app = app("http://127.0.0.1:1");

    let (status, body) = send(app.clone(), json_request("POST", "/api/voice-chat/", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No input provided"}));

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/voice-chat/")
            .header("authorization", DEV_BEARER)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No input provided"}));
}

#[tokio::test]
async fn test_voice_chat_multipart_audio() {
    let speech = Arc::new(MockSpeechToText::new("I want to book a room"));
    let app = app_with(default_pipeline(speech.clone()), "http://127.0.0.1:1");

    let (status, body) = send(app, audio_request(WAV_HEADER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcription"], "I want to book a room");
    assert_eq!(body["intent"], "book_room");
    assert_eq!(speech.received_sizes(), vec![WAV_HEADER.len()]);
}

#[tokio::test]
async fn test_voice_chat_form_input() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/voice-chat/")
        .header("authorization", DEV_BEARER)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("text=good+morning"))
        .unwrap();

    let (status, body) = send(app("http://127.0.0.1:1"), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "greeting");
    assert!(body["action"].is_null());
}

#[tokio::test]
async fn test_voice_chat_collaborator_failure() {
    let pipeline = ChatPipeline::new(
        Arc::new(MockSpeechToText::new("")),
        Arc::new(MockIntentClassifier::failing("model offline")),
        Arc::new(RegexEntityExtractor::default()),
        Arc::new(DefaultIntentHandler::default()),
        Arc::new(TemplateClarifier),
    );

    let (status, body) = send(
        app_with(pipeline, "http://127.0.0.1:1"),
        json_request("POST", "/api/voice-chat/", json!({"text": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "intent classification failed");
    assert!(body["detail"].as_str().unwrap().contains("model offline"));
}

#[tokio::test]
async fn test_voice_chat_authentication() {
    let app = jwt_app("http://127.0.0.1:1");
    let request = |auth: Option<String>| {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/voice-chat/")
            .header("content-type", "application/json");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder
            .body(Body::from(json!({"text": "hello"}).to_string()))
            .unwrap()
    };

    let (status, body) = send(app.clone(), request(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication credentials were not provided");

    let (status, body) = send(app.clone(), request(Some("Bearer not-a-jwt".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    let (status, body) = send(
        app.clone(),
        request(Some(format!("Bearer {}", token("management")))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permission denied");

    let (status, body) = send(app.clone(), request(Some(format!("Bearer {}", token("guest"))))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "greeting");

    // Wrong method is rejected before authentication
    let (status, body) = send(
        app,
        Request::builder()
            .method("GET")
            .uri("/api/voice-chat/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "POST request required");
}

#[tokio::test]
async fn test_voice_chat_role_shapes_action() {
    let app = jwt_app("http://127.0.0.1:1");

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/voice-chat/")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token("hotel_staff")))
            .body(Body::from(json!({"text": "show booking status"}).to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "open_booking_list");
}

// =============================================================================
// Provider proxy
// =============================================================================

#[tokio::test]
async fn test_create_chat_relays_created() {
    let (url, seen) = start_mock_provider().await;

    let (status, body) = send(
        app(&url),
        json_request("POST", "/api/create-chat/", json!({"agent_id": "agent_abc"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["chat_id"], "chat_123");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.auth, vec![Some("Bearer retell-key".to_string())]);
    assert_eq!(
        seen.bodies[0],
        json!({
            "agent_id": "agent_abc",
            "agent_version": 1,
            "metadata": {},
            "retell_llm_dynamic_variables": {}
        })
    );
}

#[tokio::test]
async fn test_create_chat_passes_optional_fields() {
    let (url, seen) = start_mock_provider().await;

    let (status, _) = send(
        app(&url),
        json_request(
            "POST",
            "/api/create-chat/",
            json!({
                "agent_id": "agent_abc",
                "agent_version": 3,
                "metadata": {"room": "101"},
                "retell_llm_dynamic_variables": {"guest_name": "Sam"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.bodies[0]["agent_version"], 3);
    assert_eq!(seen.bodies[0]["metadata"]["room"], "101");
    assert_eq!(seen.bodies[0]["retell_llm_dynamic_variables"]["guest_name"], "Sam");
}

#[tokio::test]
async fn test_create_chat_validation() {
    let (url, seen) = start_mock_provider().await;
    let app = app(&url);

    let (status, body) = send(app.clone(), json_request("POST", "/api/create-chat/", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "agent_id is required"}));

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/create-chat/")
            .body(Body::from("{broken"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON payload"}));

    // Validation failures never reach the provider
    assert!(seen.lock().unwrap().bodies.is_empty());
}

#[tokio::test]
async fn test_chat_completion_relays_provider_failure() {
    let (url, seen) = start_mock_provider().await;

    let (status, body) = send(
        app(&url),
        json_request(
            "POST",
            "/api/create-chat-completion/",
            json!({"chat_id": "chat_123", "content": "Is breakfast included?"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "provider request failed",
            "status_code": 500,
            "response_body": "agent crashed"
        })
    );
    assert_eq!(
        seen.lock().unwrap().bodies[0],
        json!({"chat_id": "chat_123", "content": "Is breakfast included?"})
    );
}

#[tokio::test]
async fn test_chat_completion_requires_both_fields() {
    let (url, _) = start_mock_provider().await;

    let (status, body) = send(
        app(&url),
        json_request(
            "POST",
            "/api/create-chat-completion/",
            json!({"chat_id": "chat_123", "content": ""}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "chat_id and content are required"}));
}

#[tokio::test]
async fn test_chat_lookup_and_end() {
    let (url, _) = start_mock_provider().await;
    let app = app(&url);

    let (status, body) = send(
        app.clone(),
        Request::builder().uri("/api/list-chats/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/api/retrieve-chat/chat_9/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chat_id"], "chat_9");

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/api/retrieve-chat/missing/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status_code"], 404);

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/end-chat/chat_9/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_unreachable_provider_is_server_error() {
    let url = dead_provider_url().await;

    let (status, body) = send(
        app(&url),
        json_request("POST", "/api/create-chat/", json!({"agent_id": "agent_abc"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("HTTP request failed: "));
}

// =============================================================================
// Whisper transcription
// =============================================================================

async fn whisper_endpoint(headers: HeaderMap, mut multipart: Multipart) -> impl IntoResponse {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer stt-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }

    let mut model = String::new();
    let mut file_name = String::new();
    let mut size = 0;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("model") => model = field.text().await.unwrap(),
            Some("file") => {
                file_name = field.file_name().unwrap_or_default().to_string();
                size = field.bytes().await.unwrap().len();
            }
            _ => {}
        }
    }

    (
        StatusCode::OK,
        Json(json!({"text": format!("{} {} {}", model, file_name, size)})),
    )
}

#[tokio::test]
async fn test_whisper_transcriber_uploads_audio() {
    let app = Router::new().route("/v1/audio/transcriptions", post(whisper_endpoint));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = SpeechConfig {
        base_url: format!("http://{}/v1", addr),
        api_key: Some(Secret::new("stt-key".to_string())),
        model: "whisper-1".to_string(),
    };
    let transcriber = WhisperTranscriber::new(config.clone());

    let text = transcriber
        .transcribe(&AudioInput::new(WAV_HEADER.to_vec()))
        .await
        .unwrap();
    assert_eq!(text, format!("whisper-1 recording.wav {}", WAV_HEADER.len()));

    let wrong_key = WhisperTranscriber::new(SpeechConfig {
        api_key: Some(Secret::new("other".to_string())),
        ..config
    });
    let err = wrong_key
        .transcribe(&AudioInput::new(WAV_HEADER.to_vec()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_create_chat_failure_tiers() {
    let (url, _) = start_mock_provider().await;
    let app = app(&url);

    // Provider rejection: envelope with the provider's status and raw body
    let (status, body) = send(
        app.clone(),
        json_request("POST", "/api/create-chat/", json!({"agent_id": "agent_unknown"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({
            "error": "provider request failed",
            "status_code": 422,
            "response_body": "unknown agent"
        })
    );

    // Unexpected failure: provider success with an unreadable body
    let (status, body) = send(
        app.clone(),
        json_request("POST", "/api/create-chat/", json!({"agent_id": "agent_html"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("status_code").is_none());
    assert!(!body["error"].as_str().unwrap().starts_with("HTTP request failed"));

    // Unexpected failure: JSON that is not an object
    let (status, body) = send(app, json_request("POST", "/api/create-chat/", json!([1, 2]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("status_code").is_none());
    assert!(body["error"].as_str().unwrap().contains("an array"));

    // Transport failure
    let (status, body) = send(
        app_with(
            default_pipeline(Arc::new(MockSpeechToText::new(""))),
            &dead_provider_url().await,
        ),
        json_request("POST", "/api/create-chat/", json!({"agent_id": "agent_abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("HTTP request failed: "));
}

#[tokio::test]
async fn test_chat_id_cannot_escape_its_path_segment() {
    let (url, _) = start_mock_provider().await;
    let app = app(&url);

    // Encoded slash stays inside the id instead of reaching list-chat
    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/api/retrieve-chat/..%2Flist-chat/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chat_id"], "../list-chat");

    // Encoded query delimiter stays inside the id
    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/api/retrieve-chat/chat_1%3Flimit=5/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chat_id"], "chat_1?limit=5");

    // Dot segments are refused before any provider call
    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/end-chat/%2E%2E/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid chat_id"}));
}

fn multipart_audio(boundary: &str, audio: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"recording.wav\"\r\n\
         Content-Type: audio/wav\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend_from_slice(audio);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn audio_request(audio: &[u8]) -> Request<Body> {
    let boundary = "upload-boundary";
    Request::builder()
        .method("POST")
        .uri("/api/voice-chat/")
        .header("authorization", DEV_BEARER)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_audio(boundary, audio)))
        .unwrap()
}

#[tokio::test]
async fn test_voice_chat_accepts_long_recordings() {
    let speech = Arc::new(MockSpeechToText::new("I want to book a room"));
    let app = app_with(default_pipeline(speech.clone()), "http://127.0.0.1:1");

    // Past axum's 2 MB default, well under the configured limit
    let mut audio = WAV_HEADER.to_vec();
    audio.resize(3 * 1024 * 1024, 0);

    let (status, body) = send(app, audio_request(&audio)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "book_room");
    assert_eq!(speech.received_sizes(), vec![audio.len()]);
}

#[tokio::test]
async fn test_voice_chat_over_upload_limit() {
    let speech = Arc::new(MockSpeechToText::new("hello"));
    let provider = ProviderClient::new(ProviderConfig::new("http://127.0.0.1:1", "k"));
    let config = GatewayConfig {
        max_upload_bytes: 4 * 1024,
        ..GatewayConfig::default()
    };
    let app = GatewayServer::new(config, default_pipeline(speech.clone()), provider).build_router();

    let mut audio = WAV_HEADER.to_vec();
    audio.resize(16 * 1024, 0);

    let (status, body) = send(app.clone(), audio_request(&audio)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"error": "Request body too large"}));
    assert_eq!(speech.call_count(), 0);

    // JSON bodies share the limit
    let text = "a".repeat(8 * 1024);
    let (status, _) = send(app, json_request("POST", "/api/voice-chat/", json!({"text": text}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
