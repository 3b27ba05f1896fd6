use color_eyre::eyre::Result;

use crate::advisor::{self, mask_key, AdvisorError, ChatClient};
use crate::cli::KeyCommands;
use crate::config::UserConfig;

pub async fn run(config: &UserConfig, command: KeyCommands) -> Result<()> {
    let mut vault = super::open_vault()?;

    match command {
        KeyCommands::Set { key } => {
            println!("Validating key...");

            let client = ChatClient::new(config.advisor.clone());
            let result = tokio::task::spawn_blocking(move || {
                advisor::store_validated_key(&client, &mut vault, &key).map(|_| key)
            })
            .await?;

            match result {
                Ok(key) => println!("Key {} saved.", mask_key(key.trim())),
                Err(AdvisorError::MissingCredential) => {
                    eprintln!("Error: the key is empty.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Key not saved: {}", e);
                    std::process::exit(1);
                }
            }
        }
        KeyCommands::Remove => {
            if vault.api_key()?.is_none() {
                println!("No API key stored.");
                return Ok(());
            }
            vault.remove_api_key()?;
            println!("API key removed.");
        }
        KeyCommands::Show => match vault.api_key()? {
            Some(key) => println!("{}", mask_key(&key)),
            None => println!("No API key stored."),
        },
    }

    Ok(())
}
