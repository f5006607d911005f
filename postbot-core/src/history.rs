//! Topic history: a bounded, ordered, duplicate-free list of recently used
//! topics, persisted as a single comma-joined parameter.
//!
//! The history is read at the start of a generation, embedded in the prompt so
//! the model steers away from recent topics, and written back once new content
//! has been produced. A topic is identified by its dedup key: the prefix of the
//! generated text up to the first delimiter character. This is a coarse
//! fingerprint of the opening clause, not semantic deduplication.
//!
//! There is no locking. Two invocations racing on the same parameter can both
//! read the same history and the later write drops the earlier update.

use std::sync::Arc;

use crate::config::HistoryConfig;
use crate::error::Result;
use crate::store::ParameterStore;

/// Separator of the stored value (SSM `StringList` semantics).
pub const HISTORY_SEPARATOR: &str = ",";

/// Prefix of `text` up to, but excluding, the first character in
/// `delimiters`. Returns `text` unchanged when none occurs.
pub fn extract_dedup_key<'a>(text: &'a str, delimiters: &[char]) -> &'a str {
    match text.find(|c: char| delimiters.contains(&c)) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// Appends `new_key` unless it is already present (exact match), evicting the
/// oldest entries while the history is longer than `max_len`.
pub fn record(new_key: &str, mut history: Vec<String>, max_len: usize) -> Vec<String> {
    if history.iter().any(|t| t == new_key) {
        return history;
    }
    history.push(new_key.to_string());
    if history.len() > max_len {
        let excess = history.len() - max_len;
        history.drain(..excess);
    }
    history
}

/// Splits a stored value; segments are trimmed and empty ones dropped so an
/// empty parameter yields an empty history.
pub fn parse(raw: &str) -> Vec<String> {
    raw.split(HISTORY_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The form a key is stored in. The separator cannot appear inside an entry,
/// so it is removed and whitespace collapsed; the result survives `parse`.
pub fn storable_key(key: &str) -> String {
    key.replace(HISTORY_SEPARATOR, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn serialize(history: &[String]) -> String {
    history.join(HISTORY_SEPARATOR)
}

/// History manager for one job: a parameter name, a bound and the delimiter
/// set used to cut dedup keys.
#[derive(Clone)]
pub struct TopicHistory {
    store: Arc<dyn ParameterStore>,
    parameter: String,
    max_len: usize,
    delimiters: Vec<char>,
}

impl std::fmt::Debug for TopicHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicHistory")
            .field("store", &self.store.name())
            .field("parameter", &self.parameter)
            .field("max_len", &self.max_len)
            .field("delimiters", &self.delimiters)
            .finish()
    }
}

impl TopicHistory {
    pub fn new(
        store: Arc<dyn ParameterStore>,
        parameter: impl Into<String>,
        max_len: usize,
        delimiters: Vec<char>,
    ) -> Self {
        Self {
            store,
            parameter: parameter.into(),
            max_len,
            delimiters,
        }
    }

    pub fn from_config(store: Arc<dyn ParameterStore>, config: &HistoryConfig) -> Self {
        Self::new(
            store,
            config.parameter.clone(),
            config.max_len,
            config.delimiter_chars(),
        )
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Fetch the stored history. A missing parameter is an empty history;
    /// a value longer than the bound keeps only its newest entries.
    pub async fn load(&self) -> Result<Vec<String>> {
        let raw = self.store.get(&self.parameter, false).await?;
        let mut topics = raw.as_deref().map(parse).unwrap_or_default();
        if topics.len() > self.max_len {
            let excess = topics.len() - self.max_len;
            topics.drain(..excess);
        }
        tracing::debug!(parameter = %self.parameter, count = topics.len(), "Loaded topic history");
        Ok(topics)
    }

    pub fn dedup_key<'a>(&self, text: &'a str) -> &'a str {
        extract_dedup_key(text, &self.delimiters)
    }

    pub fn contains(history: &[String], key: &str) -> bool {
        history.iter().any(|t| t == key)
    }

    /// Record the dedup key of `text`. Returns `None` when the history is
    /// unchanged (key already known, or blank), so there is nothing to persist.
    pub fn remember(&self, text: &str, history: &[String]) -> Option<Vec<String>> {
        let key = storable_key(self.dedup_key(text));
        let key = key.as_str();
        if key.is_empty() {
            tracing::warn!(parameter = %self.parameter, "Generated text has an empty dedup key, not recorded");
            return None;
        }
        if Self::contains(history, key) {
            tracing::info!(parameter = %self.parameter, key = %key, "Topic already in history");
            return None;
        }
        Some(record(key, history.to_vec(), self.max_len))
    }

    /// Overwrite the stored value with `history`.
    pub async fn persist(&self, history: &[String]) -> Result<()> {
        self.store
            .put(&self.parameter, &serialize(history), true)
            .await?;
        tracing::info!(parameter = %self.parameter, count = history.len(), "Persisted topic history");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.delete(&self.parameter).await
    }

    /// The history as embedded in prompts.
    pub fn prompt_list(history: &[String]) -> String {
        history.join(", ")
    }
}
