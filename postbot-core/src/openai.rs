//! Content generation via the OpenAI API
//!
//! Provides a `ContentGenerator` trait with an `OpenAiClient` implementation:
//! - **complete**: chat completion, one choice, returns the message text
//! - **generate_image**: image generation, returns the hosted image URL

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PostbotError, Result};

const SERVICE: &str = "OpenAI";

// ============================================================================
// ContentGenerator trait
// ============================================================================

/// Abstraction over text/image generation providers.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Single-turn completion. `None` when the model returned no content.
    async fn complete(&self, prompt: &str, model: &str) -> Result<Option<String>>;

    /// Generate one image; returns its URL.
    async fn generate_image(&self, prompt: &str, options: &ImageOptions) -> Result<String>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub model: String,
    pub size: String,
    pub quality: String,
}

// ============================================================================
// OpenAI API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    n: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// OpenAiClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.openai.com/v1".to_string())
    }

    /// Create a client with a custom base URL (for testing / proxies)
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(PostbotError::MissingCredential("OPENAI_API_KEY".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(status = status.as_u16(), message = %message, path, "OpenAI API error");
            return Err(PostbotError::UpstreamApi {
                service: SERVICE,
                status: status.as_u16(),
                body: message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ContentGenerator for OpenAiClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<Option<String>> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            n: 1,
        };

        let response: ChatResponse = self
            .post_json("/chat/completions", &request)
            .await?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PostbotError::InvalidResponse {
                service: SERVICE,
                message: "completion returned no choices".to_string(),
            })?
            .message
            .content;

        Ok(content)
    }

    async fn generate_image(&self, prompt: &str, options: &ImageOptions) -> Result<String> {
        let request = ImageRequest {
            model: &options.model,
            prompt,
            size: &options.size,
            quality: &options.quality,
            n: 1,
        };

        let response: ImageResponse = self
            .post_json("/images/generations", &request)
            .await?
            .json()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| PostbotError::InvalidResponse {
                service: SERVICE,
                message: "image generation returned no URL".to_string(),
            })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::with_base_url("test-api-key".to_string(), server.uri())
            .expect("Failed to create client")
    }

    fn image_options() -> ImageOptions {
        ImageOptions {
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
        }
    }

    #[tokio::test]
    async fn test_complete_sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "Tell me a fact" }],
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Bananas are berries." } }]
            })))
            .mount(&server)
            .await;

        let result = test_client(&server).complete("Tell me a fact", "gpt-4o").await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap().as_deref(), Some("Bananas are berries."));
    }

    #[tokio::test]
    async fn test_complete_null_content_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&server)
            .await;

        let result = test_client(&server).complete("x", "gpt-4o").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_complete_api_error_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "requests" }
            })))
            .mount(&server)
            .await;

        match test_client(&server).complete("x", "gpt-4o").await {
            Err(PostbotError::UpstreamApi { status, body, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "Rate limit reached");
            }
            other => panic!("Expected UpstreamApi, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_image_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(body_json(serde_json::json!({
                "model": "dall-e-3",
                "prompt": "A lighthouse",
                "size": "1024x1024",
                "quality": "standard",
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "created": 1,
                "data": [{ "url": "https://images.example/lighthouse.png" }]
            })))
            .mount(&server)
            .await;

        let url = test_client(&server)
            .generate_image("A lighthouse", &image_options())
            .await
            .unwrap();
        assert_eq!(url, "https://images.example/lighthouse.png");
    }

    #[tokio::test]
    async fn test_generate_image_without_url_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let result = test_client(&server)
            .generate_image("A lighthouse", &image_options())
            .await;
        assert!(matches!(result, Err(PostbotError::InvalidResponse { .. })));
    }

    #[test]
    fn test_missing_api_key() {
        let result = OpenAiClient::new(String::new());
        assert!(matches!(result, Err(PostbotError::MissingCredential(_))));
    }
}
