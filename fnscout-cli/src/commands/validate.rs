// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `fnscout validate` command - Validate a manifest file.

use std::path::Path;

use fnscout_core::{
    manifest, yaml_to_backend, Backend, DiscoveryConfig, DiscoveryResult, ManifestDocument,
};

pub async fn execute(
    config: &DiscoveryConfig,
    file: &Path,
    project: &str,
    runtime: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file.display(), "Validating manifest");

    let content = tokio::fs::read_to_string(file).await?;

    match decode(&content, project, &config.default_region, runtime) {
        Ok((version, backend)) => {
            println!("✓ Manifest is valid");
            println!();
            println!("  Spec Version:  {}", version);
            println!("  Functions:     {}", backend.cloud_functions.len());
            println!("  Topics:        {}", backend.topics.len());
            println!("  Schedules:     {}", backend.schedules.len());
            println!("  Required APIs: {}", backend.required_apis.len());
            println!();
            for func in &backend.cloud_functions {
                println!(
                    "  - {} ({}, entry point: {}, trigger: {})",
                    func.qualified_name(),
                    func.platform,
                    func.entry_point,
                    func.trigger.describe()
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Manifest validation failed:");
            eprintln!("  {}", e);
            eprintln!(
                "  Supported spec versions: {}",
                manifest::supported_versions().collect::<Vec<_>>().join(", ")
            );
            std::process::exit(1);
        }
    }
}

fn decode(
    content: &str,
    project: &str,
    region: &str,
    runtime: &str,
) -> DiscoveryResult<(String, Backend)> {
    let document = ManifestDocument::parse(content)?;
    let version = document.spec_version()?.to_string();
    let backend = yaml_to_backend(&document, project, region, runtime)?;
    Ok((version, backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reports_version() {
        let yaml = "specVersion: v1alpha1\ncloudFunctions: []\n";
        let (version, backend) = decode(yaml, "project", "us-central1", "nodejs14").unwrap();
        assert_eq!(version, "v1alpha1");
        assert!(backend.is_empty());
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        assert!(decode("specVersion: 32767beta2\n", "project", "us-central1", "nodejs14").is_err());
    }
}
