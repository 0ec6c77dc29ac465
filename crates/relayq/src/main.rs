// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relayq - REST gateway that queues outbound messages into Firebase
//! Realtime Database.
//!
//! This is the binary entry point for the relayq server.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use relayq_config::{ConfigError, RelayqConfig};

mod doctor;
mod serve;

/// Relayq - REST gateway for queueing outbound messages.
#[derive(Parser, Debug)]
#[command(name = "relayq", version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (bypasses the XDG lookup).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relayq gateway server.
    Serve,
    /// Run diagnostic checks against the configured database.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            relayq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("relayq: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Doctor { plain }) => {
            if !doctor::run_doctor(&config, plain).await {
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            print_config(&config);
        }
        None => {
            println!("relayq: use --help for available commands");
        }
    }
}

/// Loads configuration from an explicit path or the XDG hierarchy, then
/// validates it.
fn load(path: Option<&Path>) -> Result<RelayqConfig, Vec<ConfigError>> {
    match path {
        Some(path) => match relayq_config::load_config_from_path(path) {
            Ok(config) => {
                relayq_config::validate_config(&config)?;
                Ok(config)
            }
            Err(err) => Err(vec![ConfigError::Parse(err.to_string())]),
        },
        None => relayq_config::load_and_validate(),
    }
}

/// Prints the resolved configuration as TOML with secrets redacted.
fn print_config(config: &RelayqConfig) {
    let mut shown = config.clone();
    if shown.firebase.auth_token.is_some() {
        shown.firebase.auth_token = Some("[redacted]".to_string());
    }
    if shown.auth.api_key.is_some() {
        shown.auth.api_key = Some("[redacted]".to_string());
    }
    match toml::to_string_pretty(&shown) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => {
            eprintln!("relayq: failed to render config: {e}");
            std::process::exit(1);
        }
    }
}
