use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Slot under which the API key is persisted.
pub const API_KEY_SLOT: &str = "apiKey";

/// Key-value persistence for the credential record.
///
/// Injected into the resolver so tests can substitute an in-memory double.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// JSON-backed store at a user-scoped path (`~/.how/config.json`).
///
/// A missing file reads as an empty store; the first `set` creates the
/// directory and the file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_record(&self) -> Map<String, Value> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str::<Map<String, Value>>(&content).ok())
            .unwrap_or_default()
    }

    fn write_record(&self, record: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(record).context("Failed to serialize config")?;
        std::fs::write(&self.path, content).context("Failed to write config file")?;

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_record()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut record = self.read_record();
        record.insert(key.to_string(), Value::String(value.to_string()));
        self.write_record(&record)
    }
}
