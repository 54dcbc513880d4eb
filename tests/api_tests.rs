use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_test::TestServer;
use serde_json::{json, Value};

use setlist_api::{
    api::{create_router, AppState},
    config::Config,
    error::{AppError, AppResult},
    models::CandidateTrack,
    services::{
        providers::{TrackQuery, TrackSource},
        ContextBuilder, HistoryTracker, ModelClient, RecommendationService,
    },
    test_support::spawn_upstream,
};

/// Source that answers every query with the same tracks
struct FixedSource(Vec<CandidateTrack>);

#[async_trait::async_trait]
impl TrackSource for FixedSource {
    fn supports(&self, _query: &TrackQuery) -> bool {
        true
    }

    async fn fetch(&self, _query: &TrackQuery, limit: usize) -> Vec<CandidateTrack> {
        self.0.iter().take(limit).cloned().collect()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

enum FakeModel {
    Answer(String),
    Down,
}

#[async_trait::async_trait]
impl ModelClient for FakeModel {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        match self {
            FakeModel::Answer(text) => Ok(text.clone()),
            FakeModel::Down => Err(AppError::ModelUnavailable("connection refused".to_string())),
        }
    }
}

fn tracks(count: usize) -> Vec<CandidateTrack> {
    (0..count)
        .map(|i| CandidateTrack::new(format!("Track {}", i), format!("Band {}", i)))
        .collect()
}

fn create_test_server(pool: Vec<CandidateTrack>, model: FakeModel) -> TestServer {
    let service = RecommendationService::new(
        ContextBuilder::new(Arc::new(FixedSource(pool))),
        HistoryTracker::in_memory(),
        Arc::new(model),
        50,
    );
    let app = create_router(AppState::new(service));
    TestServer::new(app).unwrap()
}

fn content_lines(body: &Value) -> Vec<String> {
    body["content"]
        .as_str()
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Vec::new(), FakeModel::Down);
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_header_is_returned() {
    let server = create_test_server(Vec::new(), FakeModel::Down);
    let response = server.get("/health").await;
    let request_id = response.header("x-request-id");
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_options_catalog() {
    let server = create_test_server(Vec::new(), FakeModel::Down);
    let response = server.get("/api/options").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["genres"]
        .as_array()
        .unwrap()
        .iter()
        .any(|g| g["name"] == "Jazz"));
    assert_eq!(body["eras"][0], "Latest Releases");
    assert!(body["timesOfDay"].as_array().is_some());
}

#[tokio::test]
async fn test_empty_sources_fall_back_to_safe_defaults() {
    let server = create_test_server(Vec::new(), FakeModel::Down);

    let response = server
        .post("/api/recommendations")
        .form(&[("prompt", ""), ("genre", "Jazz"), ("era", "Latest Releases")])
        .await;

    response.assert_status_ok();
    let lines = content_lines(&response.json());
    assert_eq!(lines.len(), 5);
    let expected: HashSet<&str> = [
        "\"Blinding Lights\" by The Weeknd",
        "\"Dance The Night\" by Dua Lipa",
        "\"As It Was\" by Harry Styles",
        "\"Cruel Summer\" by Taylor Swift",
        "\"Flowers\" by Miley Cyrus",
    ]
    .into_iter()
    .collect();
    let returned: HashSet<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| line.strip_prefix(&format!("{}. ", i + 1)).unwrap())
        .collect();
    assert_eq!(returned, expected);
}

#[tokio::test]
async fn test_small_pool_is_returned_without_model() {
    let server = create_test_server(tracks(3), FakeModel::Down);

    let response = server
        .post("/api/recommendations")
        .form(&[("prompt", "chill"), ("mood", "Calm")])
        .await;

    response.assert_status_ok();
    let lines = content_lines(&response.json());
    assert_eq!(lines.len(), 3);
    for (i, line) in lines.iter().enumerate() {
        assert!(line.starts_with(&format!("{}. \"Track ", i + 1)));
    }
}

#[tokio::test]
async fn test_model_answer_is_repaired() {
    let answer = "Here you go!\n1. \"Track 2\" by Band 2\n2. \"Track 7\" by Band 7".to_string();
    let server = create_test_server(tracks(12), FakeModel::Answer(answer));

    let response = server
        .post("/api/llama")
        .form(&[("prompt", "something upbeat"), ("genre", "Pop")])
        .await;

    response.assert_status_ok();
    let lines = content_lines(&response.json());
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "1. \"Track 2\" by Band 2");
    assert_eq!(lines[1], "2. \"Track 7\" by Band 7");
    let unique: HashSet<&String> = lines.iter().collect();
    assert_eq!(unique.len(), 5);
}

#[tokio::test]
async fn test_model_down_returns_error_body() {
    let server = create_test_server(tracks(20), FakeModel::Down);

    let response = server
        .post("/api/recommendations")
        .form(&[("prompt", "anything"), ("genre", "Rock")])
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "error": "Unable to connect to recommendation service. Is the model server running?"
    }));
}

#[tokio::test]
async fn test_unknown_filter_value_is_rejected() {
    let server = create_test_server(tracks(20), FakeModel::Down);

    let response = server
        .post("/api/recommendations")
        .form(&[("prompt", "anything"), ("mood", "Sleepy")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unsupported mood: Sleepy");
}

#[tokio::test]
async fn test_prompt_passthrough() {
    let server = create_test_server(Vec::new(), FakeModel::Answer("Hello there".to_string()));

    let response = server
        .post("/api/prompt")
        .form(&[("prompt", "Say hello")])
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "content": "Hello there" }));

    let response = server.post("/api/prompt").form(&[("prompt", "")]).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_stack_against_fake_upstreams() {
    let spotify = Router::new()
        .route(
            "/token",
            post(|| async { Json(json!({ "access_token": "token", "expires_in": 3600 })) }),
        )
        .route(
            "/v1/search",
            get(|| async {
                let items: Vec<Value> = (0..8)
                    .map(|i| {
                        json!({
                            "name": format!("Calm Song {}", i),
                            "artists": [{ "id": format!("a{}", i), "name": format!("Quiet {}", i) }],
                            "popularity": 40 + i,
                            "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", i) }
                        })
                    })
                    .collect();
                Json(json!({ "tracks": { "items": items, "total": 8 } }))
            }),
        );
    let ollama = Router::new().route(
        "/api/generate",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["stream"], false);
            Json(json!({ "response": "1. \"Calm Song 3\" by Quiet 3 (Genre Match)" }))
        }),
    );
    let spotify_url = spawn_upstream(spotify).await.unwrap();
    let ollama_url = spawn_upstream(ollama).await.unwrap();

    let config = Config {
        spotify_client_id: "id".to_string(),
        spotify_client_secret: "secret".to_string(),
        spotify_api_url: format!("{}/v1", spotify_url),
        spotify_token_url: format!("{}/token", spotify_url),
        lastfm_api_key: String::new(),
        lastfm_api_url: format!("{}/lastfm", spotify_url),
        model_api_url: ollama_url,
        model_name: "llama3.2".to_string(),
        redis_url: None,
        candidate_pool_limit: 50,
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let server = TestServer::new(create_router(AppState::from_config(&config).unwrap())).unwrap();

    let response = server
        .post("/api/recommendations")
        .form(&[("prompt", "wind down"), ("mood", "Calm")])
        .await;

    response.assert_status_ok();
    let lines = content_lines(&response.json());
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "1. \"Calm Song 3\" by Quiet 3");
    assert!(lines.iter().all(|l| l.contains("\"Calm Song ")));
}
