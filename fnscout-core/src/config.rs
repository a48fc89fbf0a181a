// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration for discovery with strict validation.
//!
//! Every key is optional and falls back to a default. Values that are
//! present but out of range are rejected with a ValidationError.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, DiscoveryResult, ValidationError};
use crate::locator::DEFAULT_MANIFEST_FILE;
use crate::probe::RetryPolicy;

/// Region functions deploy to unless their manifest names one.
pub const DEFAULT_REGION: &str = "us-central1";

/// Upper bound on the overall probe timeout: 15 minutes.
const MAX_PROBE_TIMEOUT_MS: u64 = 900_000;

/// Raw probe settings as parsed from YAML (before validation).
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProbeConfig {
    #[serde(default = "default_retry_interval_ms")]
    retry_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,
}

fn default_retry_interval_ms() -> u64 {
    100
}

fn default_max_attempts() -> u32 {
    300
}

fn default_timeout_ms() -> u64 {
    30_000 // 30 seconds, matches the time user code gets to load
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for RawProbeConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_region")]
    default_region: String,
    #[serde(default = "default_manifest_file")]
    manifest_file: String,
    #[serde(default)]
    probe: RawProbeConfig,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_manifest_file() -> String {
    DEFAULT_MANIFEST_FILE.to_string()
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            manifest_file: default_manifest_file(),
            probe: RawProbeConfig::default(),
        }
    }
}

/// Validated discovery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub default_region: String,
    pub manifest_file: String,
    pub retry: RetryPolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            manifest_file: default_manifest_file(),
            retry: RetryPolicy::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Render back to the YAML shape `ConfigLoader` accepts.
    pub fn to_yaml(&self) -> DiscoveryResult<String> {
        let raw = RawConfig {
            default_region: self.default_region.clone(),
            manifest_file: self.manifest_file.clone(),
            probe: RawProbeConfig {
                retry_interval_ms: self.retry.retry_interval.as_millis() as u64,
                max_attempts: self.retry.max_attempts,
                timeout_ms: self.retry.timeout.as_millis() as u64,
                request_timeout_ms: self.retry.request_timeout.as_millis() as u64,
            },
        };

        serde_yaml::to_string(&raw).map_err(|e| DiscoveryError::ConfigParse {
            message: format!("YAML serialize error: {}", e),
        })
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> DiscoveryResult<DiscoveryConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DiscoveryError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DiscoveryError::Io {
            context: "reading config file",
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> DiscoveryResult<DiscoveryConfig> {
        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Self::validate(RawConfig::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| DiscoveryError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> DiscoveryResult<DiscoveryConfig> {
        if raw.default_region.trim().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "default_region",
                value: raw.default_region,
                reason: "Region cannot be empty".to_string(),
            }
            .into());
        }

        Self::validate_manifest_file(&raw.manifest_file)?;
        let retry = Self::validate_probe(raw.probe)?;

        Ok(DiscoveryConfig {
            default_region: raw.default_region,
            manifest_file: raw.manifest_file,
            retry,
        })
    }

    /// The manifest is looked up inside the source directory, so only a bare
    /// file name is accepted.
    fn validate_manifest_file(name: &str) -> DiscoveryResult<()> {
        let path = Path::new(name);
        let is_bare = path.file_name().map(|f| f == path.as_os_str()).unwrap_or(false);

        if name.is_empty() || !is_bare {
            return Err(ValidationError::InvalidFieldValue {
                field: "manifest_file",
                value: name.to_string(),
                reason: "Must be a plain file name without directories".to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn validate_probe(raw: RawProbeConfig) -> DiscoveryResult<RetryPolicy> {
        if raw.max_attempts == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "probe.max_attempts",
                value: "0".to_string(),
                reason: "At least one attempt is required".to_string(),
            }
            .into());
        }

        if raw.timeout_ms == 0 || raw.timeout_ms > MAX_PROBE_TIMEOUT_MS {
            return Err(ValidationError::InvalidFieldValue {
                field: "probe.timeout_ms",
                value: raw.timeout_ms.to_string(),
                reason: format!("Must be between 1 and {}ms", MAX_PROBE_TIMEOUT_MS),
            }
            .into());
        }

        if raw.retry_interval_ms > raw.timeout_ms {
            return Err(ValidationError::InvalidFieldValue {
                field: "probe.retry_interval_ms",
                value: raw.retry_interval_ms.to_string(),
                reason: format!("Must not exceed probe.timeout_ms ({})", raw.timeout_ms),
            }
            .into());
        }

        if raw.request_timeout_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "probe.request_timeout_ms",
                value: "0".to_string(),
                reason: "Request timeout must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(RetryPolicy {
            retry_interval: Duration::from_millis(raw.retry_interval_ms),
            max_attempts: raw.max_attempts,
            timeout: Duration::from_millis(raw.timeout_ms),
            request_timeout: Duration::from_millis(raw.request_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
default_region: europe-west1
manifest_file: functions.yaml
probe:
  retry_interval_ms: 50
  max_attempts: 40
  timeout_ms: 10000
  request_timeout_ms: 2000
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.default_region, "europe-west1");
        assert_eq!(config.manifest_file, "functions.yaml");
        assert_eq!(config.retry.max_attempts, 40);
        assert_eq!(config.retry.retry_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_defaults_applied() {
        let config = ConfigLoader::load_string("probe:\n  max_attempts: 7\n").unwrap();
        assert_eq!(config.default_region, DEFAULT_REGION);
        assert_eq!(config.manifest_file, "backend.yaml");
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.retry.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = ConfigLoader::load_string("\n").unwrap();
        assert_eq!(config, DiscoveryConfig::default());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = ConfigLoader::load_string("probe:\n  max_attempts: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_too_high() {
        let result = ConfigLoader::load_string("probe:\n  timeout_ms: 1000000\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_interval_above_timeout() {
        let yaml = r#"
probe:
  retry_interval_ms: 5000
  timeout_ms: 1000
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_manifest_file_with_directory_rejected() {
        assert!(ConfigLoader::load_string("manifest_file: nested/backend.yaml\n").is_err());
        assert!(ConfigLoader::load_string("manifest_file: ''\n").is_err());
        assert!(ConfigLoader::load_string("manifest_file: ..\n").is_err());
    }

    #[test]
    fn test_empty_region_rejected() {
        assert!(ConfigLoader::load_string("default_region: ''\n").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = ConfigLoader::load_string("regoin: us-east1\n");
        assert!(matches!(result, Err(DiscoveryError::ConfigParse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_file("/nonexistent/fnscout.yaml");
        assert!(matches!(result, Err(DiscoveryError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        let rendered = config.to_yaml().unwrap();
        assert_eq!(ConfigLoader::load_string(&rendered).unwrap(), config);
    }
}
