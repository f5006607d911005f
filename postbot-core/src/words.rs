//! Random-word source, used to nudge fact prompts toward varied subjects.

use reqwest::Client;

use crate::error::Result;
use crate::upstream::{ensure_success, http_client};

const SERVICE: &str = "random-word-api";

#[derive(Debug, Clone)]
pub struct RandomWordClient {
    client: Client,
    base_url: String,
}

impl RandomWordClient {
    pub fn new(base_url: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn words(&self, n: usize) -> Result<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/word", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("number", n)])
            .send()
            .await?;

        let words: Vec<String> = ensure_success(SERVICE, response).await?.json().await?;
        tracing::debug!(?words, "Fetched random words");
        Ok(words)
    }
}
