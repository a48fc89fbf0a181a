// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `v1alpha1` manifest schema.
//!
//! The payload has the shape of an empty backend plus `cloudFunctions`
//! descriptors that leave out project, region and runtime. Those are filled
//! from the deploy target unless the descriptor already names them.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_yaml::Value;

use crate::backend::{
    Backend, FunctionSpec, Platform, PubSubSpec, ScheduleSpec, ScheduleTransport, TargetService,
    Trigger,
};
use crate::error::{DiscoveryError, DiscoveryResult, ValidationError};
use crate::manifest::{DeployTarget, SPEC_VERSION_KEY};
use crate::types::FunctionId;

pub const SPEC_VERSION: &str = "v1alpha1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawManifest {
    #[serde(default, rename = "requiredAPIs")]
    required_apis: BTreeMap<String, String>,
    #[serde(default)]
    cloud_functions: Vec<RawFunction>,
    #[serde(default)]
    topics: Vec<RawPubSub>,
    #[serde(default)]
    schedules: Vec<RawSchedule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawFunction {
    platform: Platform,
    id: String,
    entry_point: String,
    trigger: Trigger,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    runtime: Option<String>,
    #[serde(default)]
    available_memory_mb: Option<u32>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    min_instances: Option<u32>,
    #[serde(default)]
    max_instances: Option<u32>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    environment_variables: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTargetService {
    id: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPubSub {
    id: String,
    #[serde(default)]
    project: Option<String>,
    target_service: RawTargetService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSchedule {
    id: String,
    #[serde(default)]
    project: Option<String>,
    schedule: String,
    #[serde(default)]
    time_zone: Option<String>,
    transport: ScheduleTransport,
    target_service: RawTargetService,
}

/// Decode a `v1alpha1` document.
pub fn decode(document: &Value, target: &DeployTarget<'_>) -> DiscoveryResult<Backend> {
    let mut payload = document.clone();
    if let Value::Mapping(ref mut mapping) = payload {
        mapping.remove(SPEC_VERSION_KEY);
    }

    let raw: RawManifest =
        serde_yaml::from_value(payload).map_err(|e| DiscoveryError::ManifestParse {
            message: format!("Invalid {} manifest: {}", SPEC_VERSION, e),
        })?;

    let mut cloud_functions = Vec::with_capacity(raw.cloud_functions.len());
    let mut seen_ids = HashSet::new();

    for (index, raw_func) in raw.cloud_functions.into_iter().enumerate() {
        let func = resolve_function(raw_func, index, target)?;

        if !seen_ids.insert(func.id.as_str().to_string()) {
            return Err(ValidationError::DuplicateFunctionId {
                id: func.id.to_string(),
            }
            .into());
        }

        cloud_functions.push(func);
    }

    let topics = raw
        .topics
        .into_iter()
        .map(|topic| {
            let target_service =
                resolve_target("topic", &topic.id, topic.target_service, &seen_ids, target)?;
            Ok(PubSubSpec {
                project: fill(topic.project, target.project),
                id: topic.id,
                target_service,
            })
        })
        .collect::<DiscoveryResult<Vec<_>>>()?;

    let schedules = raw
        .schedules
        .into_iter()
        .map(|schedule| {
            let target_service = resolve_target(
                "schedule",
                &schedule.id,
                schedule.target_service,
                &seen_ids,
                target,
            )?;
            Ok(ScheduleSpec {
                project: fill(schedule.project, target.project),
                id: schedule.id,
                schedule: schedule.schedule,
                time_zone: schedule.time_zone,
                transport: schedule.transport,
                target_service,
            })
        })
        .collect::<DiscoveryResult<Vec<_>>>()?;

    Ok(Backend {
        required_apis: raw.required_apis,
        cloud_functions,
        topics,
        schedules,
    })
}

fn resolve_function(
    raw: RawFunction,
    index: usize,
    target: &DeployTarget<'_>,
) -> DiscoveryResult<FunctionSpec> {
    let context = format!("function at index {}", index);

    let id = FunctionId::new(raw.id)?;

    if raw.entry_point.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: "entryPoint",
            context: format!("{} ('{}')", context, id),
        }
        .into());
    }

    if let (Some(min), Some(max)) = (raw.min_instances, raw.max_instances) {
        if min > max {
            return Err(ValidationError::InvalidFieldValue {
                field: "minInstances",
                value: min.to_string(),
                reason: format!("Must not exceed maxInstances ({}) in {}", max, context),
            }
            .into());
        }
    }

    Ok(FunctionSpec {
        platform: raw.platform,
        id,
        project: fill(raw.project, target.project),
        region: fill(raw.region, target.region),
        runtime: fill(raw.runtime, target.runtime),
        entry_point: raw.entry_point,
        trigger: raw.trigger,
        available_memory_mb: raw.available_memory_mb,
        timeout: raw.timeout,
        min_instances: raw.min_instances,
        max_instances: raw.max_instances,
        labels: raw.labels,
        environment_variables: raw.environment_variables,
    })
}

fn resolve_target(
    kind: &'static str,
    owner: &str,
    raw: RawTargetService,
    declared: &HashSet<String>,
    target: &DeployTarget<'_>,
) -> DiscoveryResult<TargetService> {
    if !declared.contains(&raw.id) {
        return Err(ValidationError::DanglingTarget {
            kind,
            id: owner.to_string(),
            target: raw.id,
        }
        .into());
    }

    Ok(TargetService {
        id: FunctionId::new(raw.id)?,
        region: fill(raw.region, target.region),
        project: fill(raw.project, target.project),
    })
}

fn fill(declared: Option<String>, fallback: &str) -> String {
    declared.unwrap_or_else(|| fallback.to_string())
}
