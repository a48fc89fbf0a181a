// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for fnscout.
//!
//! Every failure is an explicit enum variant. No `Box<dyn Error>`, no
//! `anyhow::Result` in the library. A missing manifest file is not an error
//! and never appears here; it is reported as `Ok(None)` by the callers.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Port;

/// Top-level error type for backend discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    // =========================================================================
    // Manifest Errors - Fail-Fast, Never Partially Decoded
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Manifest is missing a specVersion")]
    MissingSpecVersion,

    #[error("Unsupported manifest specVersion: {version}")]
    UnsupportedSpecVersion { version: String },

    #[error("Manifest parse error: {message}")]
    ManifestParse { message: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Introspection Errors
    // =========================================================================
    #[error("Introspection probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },

    // =========================================================================
    // State Machine Errors
    // =========================================================================
    #[error("Invalid discovery state transition: {0}")]
    InvalidStateTransition(#[from] StateTransitionError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} {path} - {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Semantic validation failures in a manifest or configuration document.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid port: {port} - {reason}")]
    InvalidPort { port: u16, reason: String },

    #[error("Duplicate function ID: {id}")]
    DuplicateFunctionId { id: String },

    #[error("{kind} '{id}' targets undeclared function '{target}'")]
    DanglingTarget {
        kind: &'static str,
        id: String,
        target: String,
    },
}

/// Failure of a single request against an introspection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Nothing is accepting connections on the port yet.
    #[error("Connection refused on port {port}: {reason}")]
    ConnectionRefused { port: Port, reason: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Transport error talking to {url}: {reason}")]
    Transport { url: String, reason: String },
}

/// Outcome of a whole probe loop that did not produce a manifest.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Fetch(FetchError),

    #[error("Introspection endpoint not ready after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: FetchError },

    #[error("User code failed to load within {timeout_ms}ms. Cannot determine backend specification")]
    Timeout { timeout_ms: u64 },
}

/// State transition errors for the discovery state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Discovery is in terminal state: {state}")]
    TerminalState { state: &'static str },
}

/// Result type alias using DiscoveryError.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MissingRequiredField {
            field: "entryPoint",
            context: "function 'my-func'".to_string(),
        };
        assert!(err.to_string().contains("entryPoint"));
        assert!(err.to_string().contains("my-func"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = ValidationError::DuplicateFunctionId {
            id: "dup".to_string(),
        };
        let err: DiscoveryError = validation_err.into();
        assert!(matches!(err, DiscoveryError::Validation(_)));
    }

    #[test]
    fn test_unsupported_version_names_value() {
        let err = DiscoveryError::UnsupportedSpecVersion {
            version: "32767beta2".to_string(),
        };
        assert!(err.to_string().contains("32767beta2"));
    }

    #[test]
    fn test_exhausted_reports_last_failure() {
        let port = Port::new(8080).unwrap();
        let err = ProbeError::RetriesExhausted {
            attempts: 3,
            last: FetchError::ConnectionRefused {
                port,
                reason: "Still booting".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("3 attempts"));
        assert!(message.contains("Still booting"));
    }
}
