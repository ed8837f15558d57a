use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::core::{ClusterReport, DeploymentStatus};
use crate::probes::ProbeContext;

/// Interprets `<ready>/<desired>` as printed by the replica jsonpath query.
///
/// Text without a separator, or with equal sides, is ready. Empty text means
/// the deployment was not found.
pub fn parse_deployment_status(stdout: &str) -> DeploymentStatus {
    let text = stdout.trim();
    if text.is_empty() {
        return DeploymentStatus::missing();
    }
    let ready = match text.split_once('/') {
        None => true,
        Some((ready, desired)) => ready.trim() == desired.trim(),
    };
    DeploymentStatus {
        exists: true,
        raw_status_text: text.to_string(),
        ready,
    }
}

pub fn check_deployments(
    ctx: &ProbeContext<'_>,
    report: &ClusterReport,
) -> BTreeMap<String, DeploymentStatus> {
    let mut out = BTreeMap::new();
    if !report.namespace_exists() {
        info!("namespace missing, skipping deployment check");
        return out;
    }

    let ns = ctx.namespace();
    for name in &ctx.profile.cluster.deployments {
        let result = ctx.kubectl(&format!(
            "get deployment {name} -n {ns} -o jsonpath='{{.status.readyReplicas}}/{{.spec.replicas}}'"
        ));
        let status = if result.succeeded {
            parse_deployment_status(&result.stdout)
        } else {
            DeploymentStatus::missing()
        };
        if !status.exists {
            warn!(deployment = name.as_str(), "deployment not found");
        } else if !status.ready {
            warn!(deployment = name.as_str(), status = status.raw_status_text.as_str(), "deployment not ready");
        }
        out.insert(name.clone(), status);
    }
    out
}
