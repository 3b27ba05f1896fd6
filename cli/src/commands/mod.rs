pub mod advise;
pub mod clear;
pub mod config;
pub mod history;
pub mod key;
pub mod status;
pub mod tips;
pub mod watch;

use std::time::Duration;

use battwise_platform::detect_provider;
use color_eyre::eyre::{Result, WrapErr};

use crate::advisor::Vault;
use crate::config::{database_path, UserConfig};
use crate::data::{Acquisition, Monitor, ReadingStore};
use crate::storage::SqliteStore;

/// Monitor over the detected battery and the on-disk history.
pub fn open_monitor(config: &UserConfig, interval: Duration) -> Result<Monitor<SqliteStore>> {
    let backend = open_store()?;
    let store = ReadingStore::open(backend, &config.history);
    Ok(Monitor::new(
        Acquisition::new(detect_provider()),
        store,
        interval,
    ))
}

pub fn open_vault() -> Result<Vault<SqliteStore>> {
    Ok(Vault::new(open_store()?))
}

fn open_store() -> Result<SqliteStore> {
    let path = database_path();
    SqliteStore::open(&path).wrap_err_with(|| format!("Failed to open {}", path.display()))
}

/// Age of an epoch-millisecond timestamp, rounded to whole seconds.
pub fn age_since(timestamp_ms: i64, now_ms: i64) -> String {
    let secs = (now_ms - timestamp_ms).max(0) / 1000;
    if secs == 0 {
        return "just now".to_string();
    }
    format!(
        "{} ago",
        humantime::format_duration(Duration::from_secs(secs as u64))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_since() {
        assert_eq!(age_since(10_000, 10_400), "just now");
        assert_eq!(age_since(0, 90_000), "1m 30s ago");
        assert_eq!(age_since(0, 2 * 3_600_000), "2h ago");
        assert_eq!(age_since(5_000, 0), "just now");
    }
}
