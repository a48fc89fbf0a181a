// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! fnscout CLI
//!
//! Command-line interface for discovering serverless function backends.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::OutputFormat;

/// fnscout - Discover the backend specification of a functions directory
#[derive(Parser)]
#[command(name = "fnscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Discovery configuration file path (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover the backend of a functions source directory
    Discover {
        /// Functions source directory
        directory: PathBuf,

        /// Project the functions deploy to
        #[arg(long)]
        project: String,

        /// Runtime of the functions, e.g. nodejs14
        #[arg(long)]
        runtime: String,

        /// Probe this introspection port when the directory has no manifest
        #[arg(long)]
        port: Option<u16>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Probe a starting function host for its backend
    Probe {
        /// Introspection port of the function host
        #[arg(long)]
        port: u16,

        /// Project the functions deploy to
        #[arg(long)]
        project: String,

        /// Runtime of the functions, e.g. nodejs14
        #[arg(long)]
        runtime: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Validate a manifest file
    Validate {
        /// Path to the manifest file
        file: PathBuf,

        /// Project used while decoding
        #[arg(long, default_value = "project")]
        project: String,

        /// Runtime used while decoding
        #[arg(long, default_value = "nodejs14")]
        runtime: String,
    },

    /// Print the effective discovery configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Discover {
            directory,
            project,
            runtime,
            port,
            format,
        } => {
            commands::discover::execute(&config, &directory, &project, &runtime, port, format)
                .await
        }
        Commands::Probe {
            port,
            project,
            runtime,
            format,
        } => commands::probe::execute(&config, port, &project, &runtime, format).await,
        Commands::Validate {
            file,
            project,
            runtime,
        } => commands::validate::execute(&config, &file, &project, &runtime).await,
        Commands::Config => commands::config::execute(&config).await,
    }
}
