use battwise_core::usage::summarize_usage;
use chrono::Utc;
use color_eyre::eyre::{eyre, Result};
use tracing::error;

use crate::advisor::{self, AdvisorError, ChatClient};
use crate::config::UserConfig;

pub async fn run(config: &UserConfig, last: bool) -> Result<()> {
    let mut vault = super::open_vault()?;

    if last {
        match vault.last_suggestion()? {
            Some(stored) => {
                println!(
                    "Last suggestion ({}):",
                    super::age_since(stored.timestamp, Utc::now().timestamp_millis())
                );
                println!();
                println!("{}", stored.suggestion);
            }
            None => println!("No suggestion stored yet. Run `battwise advise` to get one."),
        }
        return Ok(());
    }

    if vault.api_key()?.is_none() {
        return missing_key();
    }

    let monitor = super::open_monitor(config, config.refresh_interval())?;
    let state = monitor.refresh().await;
    let samples = monitor.history().await;
    let summary = summarize_usage(&samples, state.snapshot.as_ref());

    println!("Asking {} for advice...", config.advisor.model);

    let client = ChatClient::new(config.advisor.clone());
    let result = tokio::task::spawn_blocking(move || {
        let now = Utc::now().timestamp_millis();
        advisor::request_suggestion(&client, &mut vault, &summary, now)
    })
    .await?;

    match result {
        Ok(stored) => {
            println!();
            println!("{}", stored.suggestion);
            Ok(())
        }
        Err(AdvisorError::MissingCredential) => missing_key(),
        Err(e @ AdvisorError::InvalidCredential(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("Update it with: battwise key set <KEY>");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Advisor request failed");
            Err(eyre!(e))
        }
    }
}

fn missing_key() -> Result<()> {
    eprintln!("No API key configured.");
    eprintln!("Set one with: battwise key set <KEY>");
    std::process::exit(1);
}
