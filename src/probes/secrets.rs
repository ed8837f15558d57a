use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::core::{ActionTag, ClusterReport};
use crate::probes::{ProbeContext, ResourceKind, listing_contains};

pub fn check_secrets(ctx: &ProbeContext<'_>, report: &mut ClusterReport) -> BTreeMap<String, bool> {
    let mut present: BTreeMap<String, bool> = ctx
        .profile
        .required_secrets()
        .iter()
        .map(|s| (s.to_string(), false))
        .collect();

    if !report.namespace_exists() {
        info!("namespace missing, skipping secret check");
        return present;
    }

    let ns = ctx.namespace();
    for secret in ctx.profile.required_secrets() {
        let result = ctx.kubectl(&format!("get secret {secret} -n {ns} -o name"));
        if result.succeeded && listing_contains(&result.stdout, ResourceKind::Secret, secret) {
            present.insert(secret.to_string(), true);
        } else {
            warn!(secret, "required secret missing");
            report.push_action(ActionTag::CreateSecret {
                secret: secret.to_string(),
            });
        }
    }
    present
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::core::NamespaceInventory;
    use crate::remote::testing::ScriptedExecutor;

    #[test]
    fn no_namespace_means_no_remote_calls() {
        let exec = ScriptedExecutor::new();
        let profile = Profile::default();
        let mut report = ClusterReport::new("t");
        report.namespace = Some(NamespaceInventory::default());
        let present = check_secrets(&ProbeContext::new(&exec, &profile), &mut report);
        assert_eq!(exec.call_count(), 0);
        assert_eq!(present.len(), 2);
        assert!(present.values().all(|p| !p));
        assert!(report.actions_needed.is_empty());
    }

    #[test]
    fn each_missing_secret_gets_its_own_action() {
        let exec = ScriptedExecutor::new()
            .ok("get secret azurephotoflow-secrets", "secret/azurephotoflow-secrets")
            .fail("get secret registry-secret");
        let profile = Profile::default();
        let mut report = ClusterReport::new("t");
        report.namespace = Some(NamespaceInventory {
            exists: true,
            ..NamespaceInventory::default()
        });
        let present = check_secrets(&ProbeContext::new(&exec, &profile), &mut report);
        assert_eq!(present["azurephotoflow-secrets"], true);
        assert_eq!(present["registry-secret"], false);
        assert_eq!(
            report.actions_needed,
            vec![ActionTag::CreateSecret {
                secret: "registry-secret".to_string()
            }]
        );
    }
}
