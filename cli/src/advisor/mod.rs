//! Optional language-model battery advice.
//!
//! The advisor is stateless: [`context::build_context`] turns a usage summary
//! into a prompt, a [`ChatClient`] sends it, and the [`Vault`] keeps the
//! credential and the last suggestion in the key-value store.

pub mod client;
pub mod context;
pub mod vault;

pub use client::{Advisor, ChatClient};
pub use context::build_context;
pub use vault::{mask_key, StoredSuggestion, Vault};

use battwise_core::UsageSummary;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("No API key configured. Run `battwise key set <KEY>` first")]
    MissingCredential,

    #[error("API key was rejected (HTTP {0})")]
    InvalidCredential(u16),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Malformed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AdvisorError {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => AdvisorError::InvalidCredential(status),
            _ => AdvisorError::Api {
                status,
                message: client::error_message(body)
                    .unwrap_or_else(|| "Failed to get AI suggestion".to_string()),
            },
        }
    }
}

/// Ask the advisor for a tip and remember it.
///
/// A failure to persist the answer is logged; the advice is still returned.
pub fn request_suggestion<A, S>(
    advisor: &A,
    vault: &mut Vault<S>,
    summary: &UsageSummary,
    now_ms: i64,
) -> Result<StoredSuggestion, AdvisorError>
where
    A: Advisor + ?Sized,
    S: KeyValueStore,
{
    let api_key = vault.api_key()?.ok_or(AdvisorError::MissingCredential)?;
    let suggestion = advisor.suggest(&api_key, &build_context(summary))?;

    match vault.save_suggestion(&suggestion, now_ms) {
        Ok(stored) => Ok(stored),
        Err(e) => {
            warn!(error = %e, "Failed to store suggestion");
            Ok(StoredSuggestion {
                suggestion,
                timestamp: now_ms,
            })
        }
    }
}

/// Validate a credential and store it only when the endpoint accepts it.
pub fn store_validated_key<A, S>(
    advisor: &A,
    vault: &mut Vault<S>,
    api_key: &str,
) -> Result<(), AdvisorError>
where
    A: Advisor + ?Sized,
    S: KeyValueStore,
{
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AdvisorError::MissingCredential);
    }

    advisor.validate(api_key)?;
    vault.set_api_key(api_key)?;
    info!(key = %mask_key(api_key), "API key stored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::storage::memory::MemoryStore;

    /// Accepts one key and echoes the level line of the context back.
    struct FakeAdvisor {
        accepted: &'static str,
        contexts: RefCell<Vec<String>>,
    }

    impl FakeAdvisor {
        fn new(accepted: &'static str) -> Self {
            Self {
                accepted,
                contexts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Advisor for FakeAdvisor {
        fn suggest(&self, api_key: &str, context: &str) -> Result<String, AdvisorError> {
            if api_key != self.accepted {
                return Err(AdvisorError::InvalidCredential(401));
            }
            self.contexts.borrow_mut().push(context.to_string());
            Ok("Keep it between 20% and 80%.".to_string())
        }

        fn validate(&self, api_key: &str) -> Result<(), AdvisorError> {
            if api_key == self.accepted {
                Ok(())
            } else {
                Err(AdvisorError::InvalidCredential(401))
            }
        }
    }

    fn summary() -> UsageSummary {
        UsageSummary {
            level: Some(42),
            state_label: "Discharging".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_suggestion_requires_key() {
        let advisor = FakeAdvisor::new("gsk_good");
        let mut vault = Vault::new(MemoryStore::new());

        assert!(matches!(
            request_suggestion(&advisor, &mut vault, &summary(), 1),
            Err(AdvisorError::MissingCredential)
        ));
    }

    #[test]
    fn test_suggestion_is_persisted() {
        let advisor = FakeAdvisor::new("gsk_good");
        let mut vault = Vault::new(MemoryStore::new());
        vault.set_api_key("gsk_good").unwrap();

        let stored = request_suggestion(&advisor, &mut vault, &summary(), 1_000).unwrap();
        assert_eq!(stored.suggestion, "Keep it between 20% and 80%.");
        assert_eq!(vault.last_suggestion().unwrap(), Some(stored));
        assert!(advisor.contexts.borrow()[0].contains("- Level: 42%"));
    }

    #[test]
    fn test_suggestion_survives_storage_failure() {
        let advisor = FakeAdvisor::new("gsk_good");
        let store = MemoryStore::new();
        let fail = store.failure_switch();
        let mut vault = Vault::new(store);
        vault.set_api_key("gsk_good").unwrap();
        fail.store(true, std::sync::atomic::Ordering::SeqCst);

        let stored = request_suggestion(&advisor, &mut vault, &summary(), 7).unwrap();
        assert_eq!(stored.timestamp, 7);
        assert_eq!(vault.last_suggestion().unwrap(), None);
    }

    #[test]
    fn test_invalid_key_is_not_stored() {
        let advisor = FakeAdvisor::new("gsk_good");
        let mut vault = Vault::new(MemoryStore::new());

        assert!(matches!(
            store_validated_key(&advisor, &mut vault, "gsk_bad"),
            Err(AdvisorError::InvalidCredential(401))
        ));
        assert_eq!(vault.api_key().unwrap(), None);

        store_validated_key(&advisor, &mut vault, " gsk_good ").unwrap();
        assert_eq!(vault.api_key().unwrap().as_deref(), Some("gsk_good"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AdvisorError::from_status(401, ""),
            AdvisorError::InvalidCredential(401)
        ));
        assert!(matches!(
            AdvisorError::from_status(403, "{}"),
            AdvisorError::InvalidCredential(403)
        ));

        match AdvisorError::from_status(429, r#"{"error":{"message":"Rate limit reached"}}"#) {
            AdvisorError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match AdvisorError::from_status(500, "<html>oops</html>") {
            AdvisorError::Api { message, .. } => {
                assert_eq!(message, "Failed to get AI suggestion")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
