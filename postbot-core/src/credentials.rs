//! Secret lookup: environment variable first, then the configured
//! parameter-store entry (read with decryption).

use crate::config::CredentialsConfig;
use crate::error::{PostbotError, Result};
use crate::oauth1::OAuth1Credentials;
use crate::store::ParameterStore;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const CONSUMER_KEY: &str = "CONSUMER_KEY";
pub const CONSUMER_SECRET: &str = "CONSUMER_SECRET";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET: &str = "ACCESS_TOKEN_SECRET";

pub struct SecretResolver<'a> {
    store: &'a dyn ParameterStore,
    use_env: bool,
}

impl<'a> SecretResolver<'a> {
    pub fn new(store: &'a dyn ParameterStore) -> Self {
        Self {
            store,
            use_env: true,
        }
    }

    /// Ignores the process environment; secrets come from the store only.
    pub fn store_only(store: &'a dyn ParameterStore) -> Self {
        Self {
            store,
            use_env: false,
        }
    }

    pub async fn resolve(&self, env_var: &str, parameter: Option<&str>) -> Result<String> {
        if self.use_env {
            if let Some(value) = std::env::var(env_var).ok().filter(|v| !v.is_empty()) {
                return Ok(value);
            }
        }

        let name = parameter.ok_or_else(|| PostbotError::MissingCredential(env_var.to_string()))?;
        match self.store.get(name, true).await? {
            Some(value) if !value.is_empty() => {
                tracing::debug!(parameter = %name, "Resolved secret from parameter store");
                Ok(value)
            }
            _ => Err(PostbotError::MissingCredential(format!(
                "{} (parameter {} is empty or missing)",
                env_var, name
            ))),
        }
    }

    pub async fn openai_api_key(&self, config: &CredentialsConfig) -> Result<String> {
        self.resolve(OPENAI_API_KEY, config.openai_api_key_parameter.as_deref())
            .await
    }

    pub async fn news_api_key(&self, config: &CredentialsConfig) -> Result<String> {
        self.resolve(NEWS_API_KEY, config.news_api_key_parameter.as_deref())
            .await
    }

    pub async fn x_credentials(&self, config: &CredentialsConfig) -> Result<OAuth1Credentials> {
        Ok(OAuth1Credentials {
            consumer_key: self
                .resolve(CONSUMER_KEY, config.consumer_key_parameter.as_deref())
                .await?,
            consumer_secret: self
                .resolve(CONSUMER_SECRET, config.consumer_secret_parameter.as_deref())
                .await?,
            access_token: self
                .resolve(ACCESS_TOKEN, config.access_token_parameter.as_deref())
                .await?,
            access_token_secret: self
                .resolve(ACCESS_TOKEN_SECRET, config.access_token_secret_parameter.as_deref())
                .await?,
        })
    }
}
