pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod invocation;
pub mod media;
pub mod news;
pub mod oauth1;
pub mod openai;
pub mod prompts;
pub mod sigv4;
pub mod social;
pub mod ssm;
pub mod store;
pub mod wikipedia;
pub mod words;

mod upstream;

pub use config::{HistoryConfig, Job, PostbotConfig};
pub use credentials::SecretResolver;
pub use error::PostbotError;
pub use history::{extract_dedup_key, record, TopicHistory};
pub use invocation::{InvocationEvent, InvocationResponse};
pub use openai::{ContentGenerator, ImageOptions, OpenAiClient};
pub use social::{Posted, SocialPoster, XClient};
pub use ssm::SsmParameterStore;
pub use store::{InMemoryParameterStore, ParameterStore};
