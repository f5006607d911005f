//! Image download for media posts.

use bytes::Bytes;
use reqwest::Client;

use crate::error::{PostbotError, Result};
use crate::upstream::{ensure_status_code, http_client};

const SERVICE: &str = "image download";

/// Some image hosts (Wikimedia among them) reject clients without a browser UA.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }

    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header("user-agent", BROWSER_USER_AGENT)
            .send()
            .await?;

        let bytes = ensure_status_code(SERVICE, response, 200).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(PostbotError::InvalidResponse {
                service: SERVICE,
                message: format!("empty image at {}", url),
            });
        }
        tracing::debug!(url, size = bytes.len(), "Downloaded image");
        Ok(bytes)
    }
}
