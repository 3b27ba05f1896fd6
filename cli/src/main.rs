mod advisor;
mod cli;
mod commands;
mod config;
mod data;
mod logging;
mod storage;
mod tips;

use std::future::Future;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands};
use config::{ensure_dirs, LogLevel, UserConfig};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let mut config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    let command = cli.command.unwrap_or(Commands::Status { json: false });

    let mode = match command {
        Commands::Watch { .. } if log_level_override.is_some() => LogMode::Both,
        Commands::Watch { .. } => LogMode::File,
        _ => LogMode::Stderr,
    };
    let _guard = logging::init(config.log_level, mode, log_level_override);

    match command {
        Commands::Status { json } => block_on(commands::status::run(&config, json)),
        Commands::Watch { interval_ms, count } => {
            config.merge_with_args(interval_ms);
            let interval = config.refresh_interval();
            block_on(commands::watch::run(&config, interval, count))
        }
        Commands::History { since, trend } => commands::history::run(&config, since, trend),
        Commands::Clear { yes } => block_on(commands::clear::run(&config, yes)),
        Commands::Tips { compact, category } => commands::tips::run(compact, category),
        Commands::Advise { last } => block_on(commands::advise::run(&config, last)),
        Commands::Key { command } => block_on(commands::key::run(&config, command)),
        Commands::Config { path, reset } => commands::config::run(path, reset),
    }
}

fn block_on<F>(future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
