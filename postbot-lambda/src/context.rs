//! Per-invocation job context.
//!
//! Holds the loaded configuration and the parameter store. Credentials are
//! resolved and clients constructed when a job asks for them, so each
//! invocation reads fresh secrets and nothing lives in global state.

use postbot_core::{
    config::HistoryConfig,
    media::ImageFetcher,
    news::NewsApiClient,
    wikipedia::WikipediaClient,
    words::RandomWordClient,
    ImageOptions, OpenAiClient, ParameterStore, PostbotConfig, SecretResolver, TopicHistory,
    XClient,
};
use std::sync::Arc;

pub type Result<T> = postbot_core::error::Result<T>;

#[derive(Clone)]
pub struct JobContext {
    pub config: PostbotConfig,
    pub store: Arc<dyn ParameterStore>,
    secrets_from_env: bool,
}

impl JobContext {
    pub fn new(config: PostbotConfig, store: Arc<dyn ParameterStore>) -> Self {
        Self {
            config,
            store,
            secrets_from_env: true,
        }
    }

    /// Resolve every secret from the parameter store, ignoring the environment.
    pub fn with_store_secrets_only(mut self) -> Self {
        self.secrets_from_env = false;
        self
    }

    fn secrets(&self) -> SecretResolver<'_> {
        if self.secrets_from_env {
            SecretResolver::new(self.store.as_ref())
        } else {
            SecretResolver::store_only(self.store.as_ref())
        }
    }

    pub async fn poster(&self) -> Result<XClient> {
        let credentials = self.secrets().x_credentials(&self.config.credentials).await?;
        XClient::new(credentials, &self.config.x)
    }

    pub async fn generator(&self) -> Result<OpenAiClient> {
        let api_key = self
            .secrets()
            .openai_api_key(&self.config.credentials)
            .await?;
        OpenAiClient::with_base_url(api_key, self.config.openai.base_url.clone())
    }

    pub async fn news(&self) -> Result<NewsApiClient> {
        let api_key = self.secrets().news_api_key(&self.config.credentials).await?;
        NewsApiClient::new(api_key, self.config.headlines.news_base_url.clone())
    }

    pub fn wikipedia(&self) -> Result<WikipediaClient> {
        WikipediaClient::new(self.config.wikimedia.base_url.clone())
    }

    pub fn words(&self) -> Result<RandomWordClient> {
        RandomWordClient::new(self.config.random_fact.words_base_url.clone())
    }

    pub fn images(&self) -> Result<ImageFetcher> {
        ImageFetcher::new()
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            model: self.config.openai.image_model.clone(),
            size: self.config.openai.image_size.clone(),
            quality: self.config.openai.image_quality.clone(),
        }
    }

    pub fn history(&self, config: &HistoryConfig) -> TopicHistory {
        TopicHistory::from_config(self.store.clone(), config)
    }
}
