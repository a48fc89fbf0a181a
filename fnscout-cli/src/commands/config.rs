// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `fnscout config` command - Print the effective configuration.

use fnscout_core::DiscoveryConfig;

pub async fn execute(config: &DiscoveryConfig) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", config.to_yaml()?);
    Ok(())
}
