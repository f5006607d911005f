//! NewsAPI top headlines.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{PostbotError, Result};
use crate::upstream::{ensure_success, http_client};

const SERVICE: &str = "NewsAPI";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(PostbotError::MissingCredential("NEWS_API_KEY".to_string()));
        }
        Ok(Self {
            client: http_client()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// First `limit` top headlines from `sources` (comma-separated source ids).
    pub async fn top_headlines(&self, sources: &str, limit: usize) -> Result<Vec<Article>> {
        let url = format!("{}/v2/top-headlines", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("sources", sources), ("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let parsed: HeadlinesResponse = ensure_success(SERVICE, response).await?.json().await?;
        let articles: Vec<Article> = parsed.articles.into_iter().take(limit).collect();
        tracing::info!(sources, count = articles.len(), "Fetched top headlines");
        Ok(articles)
    }
}

/// Flattens articles into the block embedded in the summary prompt.
pub fn format_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| {
            format!(
                "Title: {} \nDescription: {} \nContent: {}\n\n",
                a.title.as_deref().unwrap_or_default(),
                a.description.as_deref().unwrap_or_default(),
                a.content.as_deref().unwrap_or_default()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_top_headlines_takes_limit() {
        let server = MockServer::start().await;
        let articles: Vec<serde_json::Value> = (0..8)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Story {}", i),
                    "description": "desc",
                    "content": null
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("sources", "bbc-news"))
            .and(query_param("apiKey", "news-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "totalResults": 8,
                "articles": articles
            })))
            .mount(&server)
            .await;

        let client = NewsApiClient::new("news-key".to_string(), server.uri()).unwrap();
        let result = client.top_headlines("bbc-news", 5).await.unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result[0].title.as_deref(), Some("Story 0"));
        assert_eq!(result[0].content, None);
    }

    #[tokio::test]
    async fn test_top_headlines_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("apiKeyInvalid"))
            .mount(&server)
            .await;

        let client = NewsApiClient::new("bad".to_string(), server.uri()).unwrap();
        match client.top_headlines("bbc-news", 5).await {
            Err(PostbotError::UpstreamApi { status, body, .. }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "apiKeyInvalid");
            }
            other => panic!("Expected UpstreamApi, got {:?}", other),
        }
    }

    #[test]
    fn test_format_articles() {
        let articles = vec![Article {
            title: Some("Rain".to_string()),
            description: Some("Wet".to_string()),
            content: None,
        }];
        assert_eq!(
            format_articles(&articles),
            "Title: Rain \nDescription: Wet \nContent: \n\n"
        );
    }
}
