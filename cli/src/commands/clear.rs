use std::io::Write;

use color_eyre::eyre::Result;

use crate::config::UserConfig;

pub async fn run(config: &UserConfig, yes: bool) -> Result<()> {
    let monitor = super::open_monitor(config, config.refresh_interval())?;
    let stats = monitor.stats().await;

    if stats.sample_count == 0 {
        println!("No readings to delete.");
        return Ok(());
    }

    if !yes {
        print!("Delete {} stored reading(s)? [y/N] ", stats.sample_count);
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    monitor.clear_data().await?;
    println!("Deleted {} reading(s).", stats.sample_count);
    Ok(())
}
