// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Discovery facade.
//!
//! Combines the manifest locator, the introspection client and the decoder.
//! The manifest file wins when present. Without one, discovery reports "no
//! backend" unless the caller asked for port based discovery, in which case
//! the introspection endpoint is probed.
//!
//! The facade holds no per-call state, so one instance can serve
//! concurrent discovery calls.

use std::path::Path;

use crate::backend::Backend;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryResult;
use crate::locator::{FsReader, ManifestLocator, ManifestReader};
use crate::manifest::{yaml_to_backend, ManifestDocument};
use crate::probe::{HttpFetcher, IntrospectionClient, ManifestFetcher};
use crate::state::{DiscoveryPhase, DiscoveryStateMachine};
use crate::types::Port;

/// Discovers the backend of a functions source directory.
#[derive(Debug, Clone)]
pub struct Discovery<R = FsReader, F = HttpFetcher> {
    locator: ManifestLocator<R>,
    client: IntrospectionClient<F>,
    region: String,
}

impl Discovery<FsReader, HttpFetcher> {
    /// Discovery over the local filesystem and `localhost` HTTP.
    pub fn from_config(config: &DiscoveryConfig) -> DiscoveryResult<Self> {
        Ok(Self::new(
            ManifestLocator::new(FsReader, config.manifest_file.clone()),
            IntrospectionClient::http(config.retry)?,
            config.default_region.clone(),
        ))
    }
}

impl<R: ManifestReader, F: ManifestFetcher> Discovery<R, F> {
    pub fn new(
        locator: ManifestLocator<R>,
        client: IntrospectionClient<F>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            locator,
            client,
            region: region.into(),
        }
    }

    /// Region attached to functions that do not declare one.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Decode the manifest file in `directory`, if there is one.
    pub async fn detect_from_yaml(
        &self,
        directory: &Path,
        project: &str,
        runtime: &str,
    ) -> DiscoveryResult<Option<Backend>> {
        let mut machine = DiscoveryStateMachine::new();
        let result = self
            .yaml_step(&mut machine, directory, project, runtime)
            .await;
        finish(&mut machine, result)
    }

    /// Decode the manifest served by a function host starting on `port`.
    pub async fn detect_from_port(
        &self,
        port: Port,
        project: &str,
        runtime: &str,
    ) -> DiscoveryResult<Backend> {
        let mut machine = DiscoveryStateMachine::new();
        let result = self.port_step(&mut machine, port, project, runtime).await;
        finish(&mut machine, result)
    }

    /// File first; fall back to probing `port` only when one is given.
    ///
    /// `Ok(None)` means no manifest file and no port to ask.
    pub async fn discover(
        &self,
        directory: &Path,
        project: &str,
        runtime: &str,
        port: Option<Port>,
    ) -> DiscoveryResult<Option<Backend>> {
        let mut machine = DiscoveryStateMachine::new();
        let result = self
            .discover_step(&mut machine, directory, project, runtime, port)
            .await;
        finish(&mut machine, result)
    }

    async fn discover_step(
        &self,
        machine: &mut DiscoveryStateMachine,
        directory: &Path,
        project: &str,
        runtime: &str,
        port: Option<Port>,
    ) -> DiscoveryResult<Option<Backend>> {
        match self.locate(machine, directory).await? {
            Some(document) => self.decode(machine, &document, project, runtime).map(Some),
            None => match port {
                Some(port) => {
                    tracing::debug!(
                        directory = %directory.display(),
                        port = %port,
                        "No manifest file, falling back to introspection"
                    );
                    self.port_step(machine, port, project, runtime)
                        .await
                        .map(Some)
                }
                None => {
                    machine.transition_to(DiscoveryPhase::Done)?;
                    Ok(None)
                }
            },
        }
    }

    async fn yaml_step(
        &self,
        machine: &mut DiscoveryStateMachine,
        directory: &Path,
        project: &str,
        runtime: &str,
    ) -> DiscoveryResult<Option<Backend>> {
        match self.locate(machine, directory).await? {
            Some(document) => self.decode(machine, &document, project, runtime).map(Some),
            None => {
                machine.transition_to(DiscoveryPhase::Done)?;
                Ok(None)
            }
        }
    }

    async fn port_step(
        &self,
        machine: &mut DiscoveryStateMachine,
        port: Port,
        project: &str,
        runtime: &str,
    ) -> DiscoveryResult<Backend> {
        machine.transition_to(DiscoveryPhase::Probing)?;
        let document = self.client.probe(port).await?;
        self.decode(machine, &document, project, runtime)
    }

    async fn locate(
        &self,
        machine: &mut DiscoveryStateMachine,
        directory: &Path,
    ) -> DiscoveryResult<Option<ManifestDocument>> {
        machine.transition_to(DiscoveryPhase::LocatingFile)?;
        self.locator.locate(directory).await
    }

    fn decode(
        &self,
        machine: &mut DiscoveryStateMachine,
        document: &ManifestDocument,
        project: &str,
        runtime: &str,
    ) -> DiscoveryResult<Backend> {
        machine.transition_to(DiscoveryPhase::Decoding)?;
        let backend = yaml_to_backend(document, project, &self.region, runtime)?;
        machine.transition_to(DiscoveryPhase::Done)?;

        tracing::info!(
            project = project,
            runtime = runtime,
            functions = backend.cloud_functions.len(),
            "Discovered backend"
        );

        Ok(backend)
    }
}

fn finish<T>(
    machine: &mut DiscoveryStateMachine,
    result: DiscoveryResult<T>,
) -> DiscoveryResult<T> {
    if result.is_err() {
        machine.fail();
    }

    tracing::debug!(
        phases = %machine.trace(),
        elapsed_ms = machine.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "Discovery finished"
    );

    result
}
