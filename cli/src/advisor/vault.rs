use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{KeyValueStore, Result, API_KEY_KEY, LAST_SUGGESTION_KEY};

/// Last advice received, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSuggestion {
    pub suggestion: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Credential and last-advice slots of the key-value store.
pub struct Vault<S> {
    store: S,
}

impl<S: KeyValueStore> Vault<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn api_key(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(API_KEY_KEY)?
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()))
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        self.store.set(API_KEY_KEY, key.trim())
    }

    pub fn remove_api_key(&mut self) -> Result<()> {
        self.store.remove(API_KEY_KEY)
    }

    /// The stored suggestion. An unreadable record is treated as absent.
    pub fn last_suggestion(&self) -> Result<Option<StoredSuggestion>> {
        let Some(json) = self.store.get(LAST_SUGGESTION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable stored suggestion");
                Ok(None)
            }
        }
    }

    pub fn save_suggestion(&mut self, suggestion: &str, timestamp: i64) -> Result<StoredSuggestion> {
        let stored = StoredSuggestion {
            suggestion: suggestion.to_string(),
            timestamp,
        };
        self.store
            .set(LAST_SUGGESTION_KEY, &serde_json::to_string(&stored)?)?;
        Ok(stored)
    }
}

/// Show only the ends of a credential.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len().max(4));
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    #[test]
    fn test_api_key_lifecycle() {
        let mut vault = Vault::new(MemoryStore::new());
        assert_eq!(vault.api_key().unwrap(), None);

        vault.set_api_key("  gsk_abcdef  ").unwrap();
        assert_eq!(vault.api_key().unwrap().as_deref(), Some("gsk_abcdef"));

        vault.remove_api_key().unwrap();
        assert_eq!(vault.api_key().unwrap(), None);
    }

    #[test]
    fn test_suggestion_wire_format() {
        let mut store = MemoryStore::new();
        store
            .set(
                LAST_SUGGESTION_KEY,
                r#"{"suggestion":"Charge to 80%.","timestamp":1700000000000}"#,
            )
            .unwrap();
        let mut vault = Vault::new(store);

        let stored = vault.last_suggestion().unwrap().unwrap();
        assert_eq!(stored.suggestion, "Charge to 80%.");
        assert_eq!(stored.timestamp, 1_700_000_000_000);

        let saved = vault.save_suggestion("Dim the screen.", 5).unwrap();
        assert_eq!(vault.last_suggestion().unwrap(), Some(saved));
    }

    #[test]
    fn test_unreadable_suggestion_is_absent() {
        let mut store = MemoryStore::new();
        store.set(LAST_SUGGESTION_KEY, "plain text").unwrap();
        let vault = Vault::new(store);

        assert_eq!(vault.last_suggestion().unwrap(), None);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("gsk_1234567890abcdef"), "gsk_...cdef");
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key(""), "****");
    }
}
