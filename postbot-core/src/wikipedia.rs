//! Wikipedia REST API: random page summary.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{PostbotError, Result};
use crate::upstream::{ensure_status_code, http_client};

const SERVICE: &str = "Wikipedia";

#[derive(Debug, Clone, PartialEq)]
pub struct RandomPage {
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    content_urls: Option<ContentUrls>,
    #[serde(default)]
    originalimage: Option<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrls,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: String,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    source: String,
}

#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: Client,
    base_url: String,
}

impl WikipediaClient {
    pub fn new(base_url: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn random_page(&self) -> Result<RandomPage> {
        let url = format!("{}/api/rest_v1/page/random/summary", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("accept", "application/problem+json")
            .send()
            .await?;

        let summary: SummaryResponse = ensure_status_code(SERVICE, response, 200)
            .await?
            .json()
            .await?;

        let link = summary
            .content_urls
            .map(|c| c.desktop.page)
            .ok_or_else(|| PostbotError::InvalidResponse {
                service: SERVICE,
                message: format!("page '{}' has no desktop URL", summary.title),
            })?;

        tracing::info!(title = %summary.title, has_image = summary.originalimage.is_some(), "Fetched random page");

        Ok(RandomPage {
            title: summary.title,
            description: summary.description,
            link,
            image_url: summary
                .originalimage
                .map(|i| i.source)
                .filter(|s| !s.is_empty()),
        })
    }
}
