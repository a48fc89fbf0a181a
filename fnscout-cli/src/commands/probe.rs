// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `fnscout probe` command - Ask a starting function host for its backend.

use fnscout_core::{Discovery, DiscoveryConfig, Port};

use super::{print_backend, OutputFormat};

pub async fn execute(
    config: &DiscoveryConfig,
    port: u16,
    project: &str,
    runtime: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = Port::new(port)?;

    tracing::info!(
        port = %port,
        max_attempts = config.retry.max_attempts,
        timeout_ms = config.retry.timeout.as_millis() as u64,
        "Probing introspection endpoint"
    );

    let discovery = Discovery::from_config(config)?;
    let backend = discovery.detect_from_port(port, project, runtime).await?;
    print_backend(&backend, format)?;

    Ok(())
}
