use crate::config::{CredentialStore, API_KEY_SLOT};
use crate::providers::CompletionClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};

const KEY_HELP: &str =
    "You can create or find your OpenAI API key at https://platform.openai.com/account/api-keys.";

/// Validates a candidate API key before it is persisted.
#[async_trait]
pub trait KeyValidator: Send + Sync {
    async fn validate(&self, api_key: &str) -> Result<()>;
}

/// Validator that performs the minimal completion round trip with the
/// candidate key.
pub struct PingValidator {
    base_url: Option<String>,
}

impl PingValidator {
    pub fn new() -> Self {
        Self { base_url: None }
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }
}

impl Default for PingValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValidator for PingValidator {
    async fn validate(&self, api_key: &str) -> Result<()> {
        let client = match &self.base_url {
            Some(url) => CompletionClient::with_base_url(api_key.to_string(), url.clone()),
            None => CompletionClient::new(api_key.to_string()),
        };
        client.ping().await?;
        Ok(())
    }
}

/// Resolves the API key for this invocation.
///
/// A key already present in the store (or, failing that, the environment) is
/// returned as-is with no network traffic unless `force_reconfigure` is set.
/// Otherwise the user is asked for a key, which must survive one validation
/// round trip before it is persisted. Validation failure aborts the run.
pub async fn resolve_with_io<R, W>(
    store: &mut dyn CredentialStore,
    env_credential: Option<String>,
    force_reconfigure: bool,
    validator: &dyn KeyValidator,
    input: &mut R,
    output: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let existing = store.get(API_KEY_SLOT).or(env_credential);

    if let Some(key) = &existing {
        if !force_reconfigure {
            return Ok(key.clone());
        }
    }

    let missing = if existing.is_some() {
        ""
    } else {
        "Missing OpenAI API Key. "
    };
    writeln!(output, "{missing}{KEY_HELP}")?;
    write!(output, "Paste your API key here: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read API key")?;
    let key = line.trim().to_string();

    if key.is_empty() {
        return Err(anyhow::anyhow!("No API key entered"));
    }

    validator.validate(&key).await?;

    store.set(API_KEY_SLOT, &key)?;
    Ok(key)
}

/// Convenience wrapper over [`resolve_with_io`] bound to stdin/stdout.
pub async fn resolve(
    store: &mut dyn CredentialStore,
    env_credential: Option<String>,
    force_reconfigure: bool,
    validator: &dyn KeyValidator,
) -> Result<String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    resolve_with_io(
        store,
        env_credential,
        force_reconfigure,
        validator,
        &mut input,
        &mut output,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryStore {
        slots: HashMap<String, String>,
    }

    impl MemoryStore {
        fn with_key(key: &str) -> Self {
            let mut slots = HashMap::new();
            slots.insert(API_KEY_SLOT.to_string(), key.to_string());
            Self { slots }
        }
    }

    impl CredentialStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.slots.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.slots.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct MockValidator {
        calls: AtomicUsize,
        reject: bool,
    }

    impl MockValidator {
        fn accepting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reject: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reject: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeyValidator for MockValidator {
        async fn validate(&self, _api_key: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                Err(anyhow::anyhow!("Incorrect API key provided"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_stored_key_is_returned_without_interaction() {
        let mut store = MemoryStore::with_key("sk-stored");
        let validator = MockValidator::accepting();
        let mut input = Cursor::new(b"" as &[u8]);
        let mut output = Vec::new();

        let key = resolve_with_io(&mut store, None, false, &validator, &mut input, &mut output)
            .await
            .unwrap();

        assert_eq!(key, "sk-stored");
        assert_eq!(validator.call_count(), 0);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let mut store = MemoryStore::with_key("sk-stored");
        let validator = MockValidator::accepting();

        for _ in 0..2 {
            let mut input = Cursor::new(b"" as &[u8]);
            let mut output = Vec::new();
            let key =
                resolve_with_io(&mut store, None, false, &validator, &mut input, &mut output)
                    .await
                    .unwrap();
            assert_eq!(key, "sk-stored");
        }

        // No validation round trip on either call
        assert_eq!(validator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_env_credential_is_fallback() {
        let mut store = MemoryStore::default();
        let validator = MockValidator::accepting();
        let mut input = Cursor::new(b"" as &[u8]);
        let mut output = Vec::new();

        let key = resolve_with_io(
            &mut store,
            Some("sk-from-env".to_string()),
            false,
            &validator,
            &mut input,
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(key, "sk-from-env");
        assert_eq!(validator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stored_key_wins_over_env() {
        let mut store = MemoryStore::with_key("sk-stored");
        let validator = MockValidator::accepting();
        let mut input = Cursor::new(b"" as &[u8]);
        let mut output = Vec::new();

        let key = resolve_with_io(
            &mut store,
            Some("sk-from-env".to_string()),
            false,
            &validator,
            &mut input,
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(key, "sk-stored");
    }

    #[tokio::test]
    async fn test_setup_flow_when_no_key_anywhere() {
        let mut store = MemoryStore::default();
        let validator = MockValidator::accepting();
        let mut input = Cursor::new(b"sk-entered\n" as &[u8]);
        let mut output = Vec::new();

        let key = resolve_with_io(&mut store, None, false, &validator, &mut input, &mut output)
            .await
            .unwrap();

        assert_eq!(key, "sk-entered");
        // One validation round trip before anything else happens
        assert_eq!(validator.call_count(), 1);
        // The key is persisted for future invocations
        assert_eq!(store.get(API_KEY_SLOT), Some("sk-entered".to_string()));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Missing OpenAI API Key. "));
        assert!(shown.contains("platform.openai.com"));
        assert!(shown.contains("Paste your API key here:"));
    }

    #[tokio::test]
    async fn test_force_reconfigure_skips_missing_prefix() {
        let mut store = MemoryStore::with_key("sk-old");
        let validator = MockValidator::accepting();
        let mut input = Cursor::new(b"sk-new\n" as &[u8]);
        let mut output = Vec::new();

        let key = resolve_with_io(&mut store, None, true, &validator, &mut input, &mut output)
            .await
            .unwrap();

        assert_eq!(key, "sk-new");
        assert_eq!(store.get(API_KEY_SLOT), Some("sk-new".to_string()));

        let shown = String::from_utf8(output).unwrap();
        assert!(!shown.contains("Missing OpenAI API Key."));
        assert!(shown.contains("platform.openai.com"));
    }

    #[tokio::test]
    async fn test_rejected_key_is_not_persisted() {
        let mut store = MemoryStore::default();
        let validator = MockValidator::rejecting();
        let mut input = Cursor::new(b"sk-bad\n" as &[u8]);
        let mut output = Vec::new();

        let result =
            resolve_with_io(&mut store, None, false, &validator, &mut input, &mut output).await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Incorrect API key"));
        assert_eq!(store.get(API_KEY_SLOT), None);
    }

    #[tokio::test]
    async fn test_blank_entry_is_rejected_before_validation() {
        let mut store = MemoryStore::default();
        let validator = MockValidator::accepting();
        let mut input = Cursor::new(b"   \n" as &[u8]);
        let mut output = Vec::new();

        let result =
            resolve_with_io(&mut store, None, false, &validator, &mut input, &mut output).await;

        assert!(result.is_err());
        assert_eq!(validator.call_count(), 0);
    }
}
