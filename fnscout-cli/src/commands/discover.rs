// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `fnscout discover` command - Discover a directory's backend.
//!
//! Reads the directory's manifest, falling back to the introspection port
//! when one is given and no manifest exists.

use std::path::Path;

use fnscout_core::{Discovery, DiscoveryConfig, Port};

use super::{print_backend, OutputFormat};

pub async fn execute(
    config: &DiscoveryConfig,
    directory: &Path,
    project: &str,
    runtime: &str,
    port: Option<u16>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        directory = %directory.display(),
        project = %project,
        runtime = %runtime,
        port = ?port,
        "Discovering backend"
    );

    let port = port.map(Port::new).transpose()?;
    let discovery = Discovery::from_config(config)?;

    match discovery.discover(directory, project, runtime, port).await? {
        Some(backend) => print_backend(&backend, format)?,
        None => {
            println!(
                "No {} found in {}. Pass --port to ask a running function host instead.",
                config.manifest_file,
                directory.display()
            );
        }
    }

    Ok(())
}
