// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Versioned manifest decoding.
//!
//! A manifest is an untyped YAML document keyed by `specVersion`. Decoding
//! looks the version up in a registry of decoders and hands the document to
//! the matching one; an absent or unknown version fails before any payload
//! is interpreted. Supporting a new schema means adding a module and one row
//! to [`DECODERS`].

pub mod v1alpha1;

use serde_yaml::Value;

use crate::backend::Backend;
use crate::error::{DiscoveryError, DiscoveryResult, ValidationError};

/// Key carrying the schema version in every manifest.
pub const SPEC_VERSION_KEY: &str = "specVersion";

/// Values the decoder injects into every function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployTarget<'a> {
    pub project: &'a str,
    pub region: &'a str,
    pub runtime: &'a str,
}

impl<'a> DeployTarget<'a> {
    pub fn new(project: &'a str, region: &'a str, runtime: &'a str) -> Self {
        Self {
            project,
            region,
            runtime,
        }
    }
}

/// Decoder for one schema version. Receives the whole document, `specVersion` included.
pub type DecodeFn = fn(&Value, &DeployTarget<'_>) -> DiscoveryResult<Backend>;

/// Known schema versions.
const DECODERS: &[(&str, DecodeFn)] = &[(v1alpha1::SPEC_VERSION, v1alpha1::decode)];

/// Spec versions this build understands.
pub fn supported_versions() -> impl Iterator<Item = &'static str> {
    DECODERS.iter().map(|(version, _)| *version)
}

fn decoder_for(version: &str) -> Option<DecodeFn> {
    DECODERS
        .iter()
        .find(|(known, _)| *known == version)
        .map(|(_, decode)| *decode)
}

/// Raw manifest as read from a file or an introspection endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument(Value);

impl ManifestDocument {
    /// Parse YAML text. Says nothing about whether the schema is valid.
    pub fn parse(content: &str) -> DiscoveryResult<Self> {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| DiscoveryError::ManifestParse {
                message: format!("YAML parse error: {}", e),
            })?;
        Ok(Self(value))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The declared `specVersion`.
    pub fn spec_version(&self) -> DiscoveryResult<&str> {
        let mapping = self.0.as_mapping().ok_or_else(|| {
            ValidationError::InvalidFieldValue {
                field: "manifest",
                value: describe_kind(&self.0).to_string(),
                reason: "Manifest must be a YAML mapping".to_string(),
            }
        })?;

        match mapping.get(SPEC_VERSION_KEY) {
            None | Some(Value::Null) => Err(DiscoveryError::MissingSpecVersion),
            Some(Value::String(version)) => Ok(version.as_str()),
            Some(other) => Err(ValidationError::InvalidFieldValue {
                field: "specVersion",
                value: describe_kind(other).to_string(),
                reason: "specVersion must be a string".to_string(),
            }
            .into()),
        }
    }
}

fn describe_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Decode a manifest into a [`Backend`], attaching project, region and runtime.
///
/// Pure: no I/O, the document is left untouched and the same inputs always
/// give the same backend.
pub fn yaml_to_backend(
    document: &ManifestDocument,
    project: &str,
    region: &str,
    runtime: &str,
) -> DiscoveryResult<Backend> {
    let version = document.spec_version()?;
    let decode = decoder_for(version).ok_or_else(|| DiscoveryError::UnsupportedSpecVersion {
        version: version.to_string(),
    })?;

    let backend = decode(
        document.as_value(),
        &DeployTarget::new(project, region, runtime),
    )?;

    tracing::debug!(
        spec_version = version,
        functions = backend.cloud_functions.len(),
        topics = backend.topics.len(),
        schedules = backend.schedules.len(),
        "Decoded manifest"
    );

    Ok(backend)
}
