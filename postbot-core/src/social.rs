//! Social posting via the X API (v2 tweets, v1.1 media upload), OAuth 1.0a signed.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::XConfig;
use crate::error::{PostbotError, Result};
use crate::oauth1::{self, OAuth1Credentials};
use crate::upstream::{ensure_status_code, http_client};

const SERVICE: &str = "X";

/// A published post.
#[derive(Debug, Clone, PartialEq)]
pub struct Posted {
    pub id: String,
    pub status: u16,
    /// Raw API response, returned to the scheduler as the invocation body.
    pub response: serde_json::Value,
}

#[async_trait]
pub trait SocialPoster: Send + Sync {
    async fn post_text(&self, text: &str) -> Result<Posted>;

    /// Upload media; returns the media id to attach to a post.
    async fn upload_media(&self, data: Bytes) -> Result<String>;

    async fn post_text_with_media(&self, text: &str, media_id: &str) -> Result<Posted>;
}

// ============================================================================
// X API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia<'a>>,
}

#[derive(Debug, Serialize)]
struct TweetMedia<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

// ============================================================================
// XClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct XClient {
    client: Client,
    credentials: OAuth1Credentials,
    api_base_url: String,
    upload_base_url: String,
}

impl XClient {
    pub fn new(credentials: OAuth1Credentials, config: &XConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            credentials,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn authorization(&self, url: &str) -> String {
        let (nonce, timestamp) = oauth1::fresh_nonce_and_timestamp();
        oauth1::authorization_header(&self.credentials, "POST", url, &[], &nonce, timestamp)
    }

    async fn create_tweet(&self, request: &TweetRequest<'_>) -> Result<Posted> {
        let url = format!("{}/2/tweets", self.api_base_url);
        let response = self
            .client
            .post(&url)
            .header("authorization", self.authorization(&url))
            .json(request)
            .send()
            .await?;

        let response = ensure_status_code(SERVICE, response, 201).await?;
        let status = response.status().as_u16();
        let raw: serde_json::Value = response.json().await?;
        let parsed: TweetResponse =
            serde_json::from_value(raw.clone()).map_err(|e| PostbotError::InvalidResponse {
                service: SERVICE,
                message: format!("unexpected tweet response: {}", e),
            })?;

        tracing::info!(id = %parsed.data.id, status, "Post published");
        Ok(Posted {
            id: parsed.data.id,
            status,
            response: raw,
        })
    }
}

#[async_trait]
impl SocialPoster for XClient {
    async fn post_text(&self, text: &str) -> Result<Posted> {
        self.create_tweet(&TweetRequest { text, media: None }).await
    }

    async fn upload_media(&self, data: Bytes) -> Result<String> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base_url);
        let form = Form::new().part("media", Part::bytes(data.to_vec()).file_name("media"));

        let response = self
            .client
            .post(&url)
            .header("authorization", self.authorization(&url))
            .multipart(form)
            .send()
            .await?;

        let uploaded: MediaUploadResponse = ensure_status_code(SERVICE, response, 200)
            .await
            .map_err(|e| match e {
                PostbotError::UpstreamApi { status, body, .. } => PostbotError::UpstreamApi {
                    service: "X media upload",
                    status,
                    body,
                },
                other => other,
            })?
            .json()
            .await?;

        tracing::info!(media_id = %uploaded.media_id_string, "Media uploaded");
        Ok(uploaded.media_id_string)
    }

    async fn post_text_with_media(&self, text: &str, media_id: &str) -> Result<Posted> {
        self.create_tweet(&TweetRequest {
            text,
            media: Some(TweetMedia {
                media_ids: vec![media_id],
            }),
        })
        .await
    }
}
