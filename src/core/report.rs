use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::{ActionTag, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonState {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub installed: bool,
    pub running: bool,
    pub api_responsive: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamespaceInventory {
    pub exists: bool,
    pub secrets: BTreeSet<String>,
    pub deployments: BTreeSet<String>,
    pub services: BTreeSet<String>,
    pub ingress: BTreeSet<String>,
    pub persistent_volume_claims: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub exists: bool,
    pub raw_status_text: String,
    pub ready: bool,
}

impl DeploymentStatus {
    pub fn missing() -> Self {
        Self {
            exists: false,
            raw_status_text: "missing".to_string(),
            ready: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageStatus {
    pub default_storage_class: Option<String>,
    pub available_classes: Vec<String>,
    pub persistent_volume_count: u64,
}

/// Accumulated cluster state. Stages fill it in order; `cluster_ready` is written last.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterReport {
    pub schema_version: String,
    pub tool_version: String,
    pub generated_at: String,
    pub target: String,
    pub elapsed_ms: u64,
    pub cluster_ready: bool,
    pub runtime_status: Option<RuntimeStatus>,
    pub addons: BTreeMap<String, AddonState>,
    pub namespace: Option<NamespaceInventory>,
    pub secrets_present: BTreeMap<String, bool>,
    pub deployments: BTreeMap<String, DeploymentStatus>,
    pub storage: Option<StorageStatus>,
    pub actions_needed: Vec<ActionTag>,
    pub recommendations: Vec<Recommendation>,
}

impl ClusterReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn namespace_exists(&self) -> bool {
        self.namespace.as_ref().is_some_and(|ns| ns.exists)
    }

    pub fn push_action(&mut self, action: ActionTag) {
        self.actions_needed.push(action);
    }
}
