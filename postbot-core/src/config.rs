use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PostbotConfig {
    pub service: ServiceConfig,
    pub aws: AwsConfig,
    pub credentials: CredentialsConfig,
    pub openai: OpenAiConfig,
    pub x: XConfig,
    pub random_fact: RandomFactConfig,
    pub headlines: HeadlinesConfig,
    pub wikimedia: WikimediaConfig,
    pub year_progress: YearProgressConfig,
}

/// The posting variants a single invocation can run.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Job {
    #[default]
    RandomFact,
    Headlines,
    Wikimedia,
    YearProgress,
}

impl Job {
    pub fn as_str(&self) -> &'static str {
        match self {
            Job::RandomFact => "random_fact",
            Job::Headlines => "headlines",
            Job::Wikimedia => "wikimedia",
            Job::YearProgress => "year_progress",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Job {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "random_fact" => Ok(Job::RandomFact),
            "headlines" => Ok(Job::Headlines),
            "wikimedia" => Ok(Job::Wikimedia),
            "year_progress" => Ok(Job::YearProgress),
            other => Err(format!(
                "unknown job '{}' (expected random_fact, headlines, wikimedia or year_progress)",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub job: Job,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            job: Job::default(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AwsConfig {
    /// Falls back to `AWS_REGION` when unset.
    pub region: Option<String>,
    /// Overrides `https://ssm.{region}.amazonaws.com`.
    pub ssm_endpoint: Option<String>,
}

/// Parameter-store names for secrets. An environment variable with the
/// conventional name always wins over the parameter.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub openai_api_key_parameter: Option<String>,
    pub news_api_key_parameter: Option<String>,
    pub consumer_key_parameter: Option<String>,
    pub consumer_secret_parameter: Option<String>,
    pub access_token_parameter: Option<String>,
    pub access_token_secret_parameter: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct XConfig {
    pub api_base_url: String,
    pub upload_base_url: String,
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.twitter.com".to_string(),
            upload_base_url: "https://upload.twitter.com".to_string(),
        }
    }
}

/// Where a job keeps its topic history and how keys are cut from generated text.
#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    pub parameter: String,
    pub max_len: usize,
    pub delimiters: String,
}

impl HistoryConfig {
    pub fn delimiter_chars(&self) -> Vec<char> {
        self.delimiters.chars().collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RandomFactConfig {
    pub model: String,
    pub history: HistoryConfig,
    /// Number of random words mixed into the prompt; 0 disables the word source.
    pub seed_words: usize,
    pub words_base_url: String,
    pub generate_image: bool,
}

impl Default for RandomFactConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            history: HistoryConfig {
                parameter: "/randomtweets/used_topics".to_string(),
                max_len: 10,
                delimiters: ".!?:,".to_string(),
            },
            seed_words: 0,
            words_base_url: "https://random-word-api.herokuapp.com".to_string(),
            generate_image: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HeadlinesConfig {
    pub model: String,
    pub history: HistoryConfig,
    pub news_base_url: String,
    pub sources: String,
    pub article_limit: usize,
}

impl Default for HeadlinesConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            history: HistoryConfig {
                parameter: "/randomtweets/news_history".to_string(),
                max_len: 5,
                delimiters: ".!?:".to_string(),
            },
            news_base_url: "https://newsapi.org".to_string(),
            sources: "bbc-news".to_string(),
            article_limit: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WikimediaConfig {
    pub base_url: String,
}

impl Default for WikimediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct YearProgressConfig {
    pub utc_offset_hours: i32,
    pub delay_seconds: u64,
}

impl Default for YearProgressConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 9,
            delay_seconds: 45,
        }
    }
}

impl PostbotConfig {
    /// Layers an optional TOML file and `POSTBOT__SECTION__KEY` env overrides
    /// on top of the built-in defaults.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        // History tables differ per job, so their defaults are seeded key by
        // key and a partial table or a single env override still merges.
        let defaults = PostbotConfig::default();
        for (section, history) in [
            ("random_fact", &defaults.random_fact.history),
            ("headlines", &defaults.headlines.history),
        ] {
            builder = builder
                .set_default(format!("{section}.history.parameter"), history.parameter.as_str())?
                .set_default(format!("{section}.history.max_len"), history.max_len as i64)?
                .set_default(format!("{section}.history.delimiters"), history.delimiters.as_str())?;
        }

        let s = builder
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("POSTBOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        s.try_deserialize()
    }

    pub fn history_for(&self, job: Job) -> Option<&HistoryConfig> {
        match job {
            Job::RandomFact => Some(&self.random_fact.history),
            Job::Headlines => Some(&self.headlines.history),
            Job::Wikimedia | Job::YearProgress => None,
        }
    }
}
