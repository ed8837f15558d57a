use crate::config::Profile;
use crate::core::{ActionTag, ClusterReport, Recommendation};

/// Classifies the deployment strategy from a populated report. No remote calls.
///
/// Exactly one primary class is emitted first, followed by any independent
/// remediation recommendations.
pub fn recommendations(report: &ClusterReport, profile: &Profile) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let deployments = &report.deployments;
    let primary = if !report.namespace_exists() {
        Recommendation::FullDeploymentNoNamespace
    } else if !deployments.values().any(|d| d.exists) {
        Recommendation::FullDeploymentNoDeployments
    } else if deployments.values().all(|d| d.ready) {
        Recommendation::UpdateDeployment
    } else {
        Recommendation::PartialDeployment
    };
    out.push(primary);

    let has_secret = |name: &str| report.secrets_present.get(name).copied().unwrap_or(false);
    if !has_secret(profile.cluster.app_secret.as_str()) {
        out.push(Recommendation::CreateSecrets);
    }
    if !has_secret(profile.cluster.registry_secret.as_str()) {
        out.push(Recommendation::CreateRegistrySecret);
    }

    if report
        .actions_needed
        .iter()
        .any(|a| matches!(a, ActionTag::EnableAddons { .. }))
    {
        out.push(Recommendation::EnableAddons);
    }

    out
}

/// Runtime installed and answering, with no install/start action outstanding.
///
/// Restart, create and enable actions are remediation only and do not block.
pub fn cluster_ready(report: &ClusterReport) -> bool {
    let Some(runtime) = &report.runtime_status else {
        return false;
    };
    runtime.installed
        && runtime.api_responsive
        && !report.actions_needed.iter().any(ActionTag::blocks_readiness)
}

/// Last step of a full check. Nothing mutates the report afterwards.
pub fn finalize(report: &mut ClusterReport, profile: &Profile) {
    report.recommendations = recommendations(report, profile);
    report.cluster_ready = cluster_ready(report);
}
