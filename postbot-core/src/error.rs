use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostbotError {
    #[error("Parameter store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("{service} request returned an error: {status} {body}")]
    UpstreamApi {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    NoContentFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

impl PostbotError {
    /// Status code reported to the scheduler for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            PostbotError::NoContentFound(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, PostbotError>;
