/// Local generative model client
///
/// Talks to an Ollama-compatible endpoint: a single non-streaming POST to
/// `{api_url}/api/generate` with `{model, prompt, stream: false}`, answered by
/// `{response}`. No retries; every failure surfaces as `ModelUnavailable`.
use crate::error::{AppError, AppResult};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

const GENERATE_PATH: &str = "/api/generate";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends `prompt` and returns the raw generated text
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    http_client: HttpClient,
    api_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}{}", self.api_url, GENERATE_PATH);

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling model");

        let response = self
            .http_client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Model endpoint unreachable");
                AppError::ModelUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Model endpoint returned an error");
            return Err(AppError::ModelUnavailable(format!(
                "Model endpoint returned status {}",
                status
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Unparseable model response");
            AppError::ModelUnavailable(format!("Failed to parse model response: {}", e))
        })?;

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "llama3.2");
                assert_eq!(body["stream"], false);
                Json(json!({
                    "response": format!("echo: {}", body["prompt"].as_str().unwrap_or_default())
                }))
            }),
        );
        let base = spawn_upstream(app).await.unwrap();
        let client = OllamaClient::new(format!("{}/", base), "llama3.2".to_string());

        let text = client.generate("hello").await.unwrap();
        assert_eq!(text, "echo: hello");
    }

    #[tokio::test]
    async fn test_error_status_is_model_unavailable() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_upstream(app).await.unwrap();
        let client = OllamaClient::new(base, "llama3.2".to_string());

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OllamaClient::new(format!("http://{}", addr), "llama3.2".to_string());
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }
}
