// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Normalized in-memory model of a deployable backend.
//!
//! A [`Backend`] is what discovery hands to the deploy pipeline: every
//! function already carries the project, region and runtime it will be
//! deployed with. Values are built once per decode and never mutated in
//! place; derive new specs by cloning.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::FunctionId;

/// Functions platform generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// First generation Cloud Functions.
    #[serde(rename = "gcfv1")]
    Gcfv1,
    /// Second generation Cloud Functions.
    #[serde(rename = "gcfv2")]
    Gcfv2,
}

impl Platform {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gcfv1 => "gcfv1",
            Self::Gcfv2 => "gcfv2",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Trigger for an HTTPS function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpsTrigger {
    pub allow_insecure: bool,
}

/// Trigger for an event-driven function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventTrigger {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub event_filters: BTreeMap<String, String>,
    #[serde(default)]
    pub retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_email: Option<String>,
}

/// What invokes a function. Distinguished by shape: event triggers carry
/// an `eventType`, HTTPS triggers an `allowInsecure` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    Event(EventTrigger),
    Https(HttpsTrigger),
}

impl Trigger {
    pub fn is_https(&self) -> bool {
        matches!(self, Self::Https(_))
    }

    /// Short human readable label.
    pub fn describe(&self) -> String {
        match self {
            Self::Https(https) if https.allow_insecure => "https (insecure allowed)".to_string(),
            Self::Https(_) => "https".to_string(),
            Self::Event(event) => format!("event: {}", event.event_type),
        }
    }
}

/// Fully resolved function specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub platform: Platform,
    pub id: FunctionId,
    pub project: String,
    pub region: String,
    pub runtime: String,
    pub entry_point: String,
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_memory_mb: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_variables: BTreeMap<String, String>,
}

impl FunctionSpec {
    /// Fully qualified resource name, e.g. `projects/p/locations/us-central1/functions/f`.
    pub fn qualified_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/functions/{}",
            self.project, self.region, self.id
        )
    }
}

/// Reference from a topic or schedule to the function it invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetService {
    pub id: FunctionId,
    pub region: String,
    pub project: String,
}

/// Pub/Sub topic a backend publishes scheduled invocations to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubSpec {
    pub id: String,
    pub project: String,
    pub target_service: TargetService,
}

/// How a scheduler job reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleTransport {
    Pubsub,
    Https,
}

/// Cloud Scheduler job driving a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    pub id: String,
    pub project: String,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    pub transport: ScheduleTransport,
    pub target_service: TargetService,
}

/// The full set of deployable resources discovered for one source directory.
///
/// `Backend::default()` is the empty baseline; a decoded backend is that
/// baseline with the declared collections filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    /// Friendly API name to API host.
    #[serde(rename = "requiredAPIs")]
    pub required_apis: BTreeMap<String, String>,
    pub cloud_functions: Vec<FunctionSpec>,
    pub topics: Vec<PubSubSpec>,
    pub schedules: Vec<ScheduleSpec>,
}

impl Backend {
    /// The empty baseline.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when nothing would be deployed.
    pub fn is_empty(&self) -> bool {
        self.required_apis.is_empty()
            && self.cloud_functions.is_empty()
            && self.topics.is_empty()
            && self.schedules.is_empty()
    }

    /// Look up a function by ID.
    pub fn function(&self, id: &str) -> Option<&FunctionSpec> {
        self.cloud_functions.iter().find(|f| f.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn https_function() -> FunctionSpec {
        FunctionSpec {
            platform: Platform::Gcfv1,
            id: FunctionId::new("function").unwrap(),
            project: "project".to_string(),
            region: "us-central1".to_string(),
            runtime: "nodejs14".to_string(),
            entry_point: "entrypoint".to_string(),
            trigger: Trigger::Https(HttpsTrigger {
                allow_insecure: false,
            }),
            available_memory_mb: None,
            timeout: None,
            min_instances: None,
            max_instances: None,
            labels: BTreeMap::new(),
            environment_variables: BTreeMap::new(),
        }
    }

    #[test]
    fn test_empty_baseline() {
        let backend = Backend::empty();
        assert!(backend.is_empty());
        assert_eq!(backend, Backend::default());
    }

    #[test]
    fn test_function_lookup() {
        let backend = Backend {
            cloud_functions: vec![https_function()],
            ..Backend::empty()
        };
        assert!(!backend.is_empty());
        assert!(backend.function("function").is_some());
        assert!(backend.function("missing").is_none());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            https_function().qualified_name(),
            "projects/project/locations/us-central1/functions/function"
        );
    }

    #[test]
    fn test_trigger_shapes() {
        let https: Trigger = serde_yaml::from_str("allowInsecure: true").unwrap();
        assert!(https.is_https());

        let event: Trigger = serde_yaml::from_str(
            r#"
eventType: google.pubsub.topic.publish
eventFilters:
  resource: projects/p/topics/t
retry: true
"#,
        )
        .unwrap();
        match event {
            Trigger::Event(ref e) => {
                assert_eq!(e.event_type, "google.pubsub.topic.publish");
                assert!(e.retry);
                assert_eq!(e.event_filters.len(), 1);
            }
            Trigger::Https(_) => panic!("expected event trigger"),
        }
        assert_eq!(event.describe(), "event: google.pubsub.topic.publish");
    }

    #[test]
    fn test_trigger_rejects_mixed_shape() {
        let mixed: Result<Trigger, _> =
            serde_yaml::from_str("{eventType: foo, allowInsecure: true}");
        assert!(mixed.is_err());
    }

    #[test]
    fn test_platform_wire_names() {
        let platform: Platform = serde_yaml::from_str("gcfv2").unwrap();
        assert_eq!(platform, Platform::Gcfv2);
        assert_eq!(Platform::Gcfv1.to_string(), "gcfv1");
    }
}
