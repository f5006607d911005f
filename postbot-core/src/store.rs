//! Parameter store abstraction
//!
//! Small persisted values (credentials, topic histories) live in a key/value
//! parameter store. Production uses AWS Systems Manager (see [`crate::ssm`]);
//! tests and dry runs use [`InMemoryParameterStore`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{PostbotError, Result};

#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Read a parameter. Returns `None` when the parameter does not exist.
    async fn get(&self, name: &str, with_decryption: bool) -> Result<Option<String>>;

    /// Write a parameter. With `overwrite == false` an existing value is an error.
    async fn put(&self, name: &str, value: &str, overwrite: bool) -> Result<()>;

    /// Remove a parameter. Removing a missing parameter is not an error.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Mutex-guarded map, used by tests and local dry runs.
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| PostbotError::StorageUnavailable("in-memory store poisoned".to_string()))
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get(&self, name: &str, _with_decryption: bool) -> Result<Option<String>> {
        Ok(self.lock()?.get(name).cloned())
    }

    async fn put(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        let mut values = self.lock()?;
        if !overwrite && values.contains_key(name) {
            return Err(PostbotError::StorageUnavailable(format!(
                "parameter {} already exists",
                name
            )));
        }
        values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
