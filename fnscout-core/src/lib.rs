// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! fnscout Core Library
//!
//! Discovers the backend specification of a serverless functions source
//! directory, either from its `backend.yaml` manifest or by probing the
//! introspection endpoint of the starting function host, and normalizes it
//! into a typed [`Backend`].

pub mod backend;
pub mod config;
pub mod discovery;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod probe;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use backend::{Backend, FunctionSpec, Platform, Trigger};
pub use config::{ConfigLoader, DiscoveryConfig, DEFAULT_REGION};
pub use discovery::Discovery;
pub use error::{DiscoveryError, DiscoveryResult, FetchError, ProbeError, ValidationError};
pub use locator::{FsReader, ManifestLocator, ManifestReader};
pub use manifest::{yaml_to_backend, ManifestDocument};
pub use probe::{HttpFetcher, IntrospectionClient, ManifestFetcher, RetryPolicy};
pub use state::{DiscoveryPhase, DiscoveryStateMachine};
pub use types::{FunctionId, Port};
