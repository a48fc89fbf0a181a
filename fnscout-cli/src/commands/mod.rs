// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules and shared output helpers.

pub mod config;
pub mod discover;
pub mod probe;
pub mod validate;

use std::path::Path;

use clap::ValueEnum;
use thiserror::Error;

use fnscout_core::{Backend, ConfigLoader, DiscoveryConfig, DiscoveryResult};

/// How a discovered backend is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Yaml,
    Json,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load the configuration file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> DiscoveryResult<DiscoveryConfig> {
    match path {
        Some(path) => {
            tracing::debug!(config = %path.display(), "Loading discovery configuration");
            ConfigLoader::load_file(path)
        }
        None => Ok(DiscoveryConfig::default()),
    }
}

pub fn print_backend(backend: &Backend, format: OutputFormat) -> Result<(), OutputError> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(backend)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(backend)?),
        OutputFormat::Table => print_table(backend),
    }
    Ok(())
}

fn print_table(backend: &Backend) {
    if backend.cloud_functions.is_empty() {
        println!("No functions declared in backend.");
        return;
    }

    println!("╔═══════════════════╦════════╦═══════════════╦════════════╦══════════════════════════╗");
    println!("║ ID                ║ Gen    ║ Region        ║ Runtime    ║ Trigger                  ║");
    println!("╠═══════════════════╬════════╬═══════════════╬════════════╬══════════════════════════╣");

    for func in &backend.cloud_functions {
        println!(
            "║ {:<17} ║ {:<6} ║ {:<13} ║ {:<10} ║ {:<24} ║",
            func.id.as_str(),
            func.platform.name(),
            func.region,
            func.runtime,
            func.trigger.describe()
        );
    }

    println!("╚═══════════════════╩════════╩═══════════════╩════════════╩══════════════════════════╝");
    println!();
    println!(
        "Total: {} function(s), {} topic(s), {} schedule(s)",
        backend.cloud_functions.len(),
        backend.topics.len(),
        backend.schedules.len()
    );

    if !backend.required_apis.is_empty() {
        println!();
        println!("Required APIs:");
        for (name, api) in &backend.required_apis {
            println!("  • {} ({})", name, api);
        }
    }
}
