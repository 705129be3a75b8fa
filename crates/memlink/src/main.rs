// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! memlink - local memory-extraction bridge.
//!
//! Command-line front end over the local memory service.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use memlink_core::ModelKind;

/// memlink - local memory-extraction bridge for chat hosts.
#[derive(Parser, Debug)]
#[command(name = "memlink", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List connection profiles discovered in host settings.
    Profiles,
    /// Resolve a connection profile into base URL, model, and (masked) key.
    Resolve {
        /// Profile id, or "default" for the first profile.
        #[arg(default_value = "default")]
        profile: String,
    },
    /// List the models a profile's endpoint offers.
    Models {
        #[arg(default_value = "default")]
        profile: String,
        /// "llm" or "embedding".
        #[arg(long, default_value = "llm")]
        kind: ModelKind,
        /// Bypass the listing cache.
        #[arg(long)]
        force: bool,
    },
    /// Start the worker if needed and report its health.
    Health,
    /// List memory categories known to the worker.
    Categories,
    /// Memorize a conversation read from a JSON file and wait for the result.
    Memorize {
        /// JSON array of chat messages.
        file: PathBuf,
        #[arg(long, default_value = "default")]
        user: String,
        #[arg(long, default_value = "default")]
        agent: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => memlink_config::load_and_validate_path(path),
        None => memlink_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            memlink_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    if let Err(e) = commands::run(cli.command, &config).await {
        eprintln!("memlink: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memlink={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
