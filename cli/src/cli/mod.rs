use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::tips::TipCategory;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Take one reading and print it with derived metrics (default)
    Status {
        /// Print the dashboard state as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Keep polling and print a line per update
    #[command(alias = "w")]
    Watch {
        /// Update interval in milliseconds (defaults to refresh_ms from config)
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Stop after this many updates (0 = until Ctrl-C)
        #[arg(short, long, default_value_t = 0)]
        count: u32,
    },

    /// List stored readings
    History {
        /// How far back to look (e.g. 30m, 6h, 2days)
        #[arg(short, long, default_value = "24h", value_parser = humantime::parse_duration)]
        since: Duration,

        /// Show the 24h trend, downsampled, instead of every reading
        #[arg(short, long, conflicts_with = "since")]
        trend: bool,
    },

    /// Delete all stored readings
    Clear {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show battery health tips
    Tips {
        /// Only the first few tips
        #[arg(short, long)]
        compact: bool,

        /// Only tips in this category (charging, temperature, usage, storage)
        #[arg(long)]
        category: Option<TipCategory>,
    },

    /// Ask the language model for a personalized tip
    #[command(alias = "ai")]
    Advise {
        /// Print the last stored suggestion instead of asking again
        #[arg(short, long)]
        last: bool,
    },

    /// Manage the advisor API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Show configuration
    Config {
        /// Print config file path
        #[arg(long)]
        path: bool,

        /// Reset config to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyCommands {
    /// Validate a key and store it
    Set {
        /// API key for the chat-completions endpoint
        key: String,
    },

    /// Forget the stored key
    #[command(alias = "rm")]
    Remove,

    /// Show the stored key, masked
    Show,
}

/// Battery health monitor with history, derived metrics and optional AI advice
#[derive(Debug, Parser)]
#[command(name = "battwise", version, verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}
