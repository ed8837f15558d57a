use std::collections::BTreeSet;

use tracing::info;

use crate::core::{ActionTag, ClusterReport, NamespaceInventory};
use crate::probes::ProbeContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Namespace,
    Secret,
    Deployment,
    Service,
    Ingress,
    PersistentVolumeClaim,
    StorageClass,
}

impl ResourceKind {
    pub const fn resource(self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespace",
            ResourceKind::Secret => "secrets",
            ResourceKind::Deployment => "deployments",
            ResourceKind::Service => "services",
            ResourceKind::Ingress => "ingress",
            ResourceKind::PersistentVolumeClaim => "pvc",
            ResourceKind::StorageClass => "storageclass",
        }
    }

    /// Type prefixes `-o name` may put in front of a name, longest first.
    pub const fn prefixes(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Namespace => &["namespace/"],
            ResourceKind::Secret => &["secret/"],
            ResourceKind::Deployment => &["deployment.apps/", "deployment/"],
            ResourceKind::Service => &["service/"],
            ResourceKind::Ingress => &[
                "ingress.networking.k8s.io/",
                "ingress.extensions/",
                "ingress/",
            ],
            ResourceKind::PersistentVolumeClaim => &["persistentvolumeclaim/"],
            ResourceKind::StorageClass => &["storageclass.storage.k8s.io/"],
        }
    }

    pub fn strip<'a>(self, line: &'a str) -> &'a str {
        self.prefixes()
            .iter()
            .find_map(|p| line.strip_prefix(p))
            .unwrap_or(line)
    }
}

/// Splits `-o name` output into bare resource names.
pub fn parse_listing(stdout: &str, kind: ResourceKind) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| kind.strip(l).to_string())
        .filter(|name| !(kind == ResourceKind::Secret && name.starts_with("default-token")))
        .collect()
}

/// Exact name match on a listing; substrings of other names do not count.
pub fn listing_contains(stdout: &str, kind: ResourceKind, name: &str) -> bool {
    stdout
        .lines()
        .map(str::trim)
        .any(|l| kind.strip(l) == name)
}

/// Existence check plus content listing. An absent namespace gets no further queries.
pub fn check_namespace(ctx: &ProbeContext<'_>, report: &mut ClusterReport) -> NamespaceInventory {
    let ns = ctx.namespace();
    let mut inv = NamespaceInventory::default();

    let result = ctx.kubectl(&format!("get namespace {ns} -o name"));
    if !(result.succeeded && listing_contains(&result.stdout, ResourceKind::Namespace, ns)) {
        info!(namespace = ns, "namespace does not exist");
        report.push_action(ActionTag::CreateNamespace {
            namespace: ns.to_string(),
        });
        return inv;
    }
    inv.exists = true;

    let list = |kind: ResourceKind| -> BTreeSet<String> {
        let result = ctx.kubectl(&format!("get {} -n {ns} -o name", kind.resource()));
        if result.succeeded {
            parse_listing(&result.stdout, kind)
        } else {
            BTreeSet::new()
        }
    };
    inv.secrets = list(ResourceKind::Secret);
    inv.deployments = list(ResourceKind::Deployment);
    inv.services = list(ResourceKind::Service);
    inv.ingress = list(ResourceKind::Ingress);
    inv.persistent_volume_claims = list(ResourceKind::PersistentVolumeClaim);

    info!(
        namespace = ns,
        secrets = inv.secrets.len(),
        deployments = inv.deployments.len(),
        services = inv.services.len(),
        ingress = inv.ingress.len(),
        pvcs = inv.persistent_volume_claims.len(),
        "namespace inventory"
    );
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::remote::testing::ScriptedExecutor;

    #[test]
    fn listing_strips_prefixes_and_default_tokens() {
        let stdout = "secret/app\nsecret/default-token-abcde\n\nsecret/registry-secret\n";
        let names = parse_listing(stdout, ResourceKind::Secret);
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["app", "registry-secret"]
        );
    }

    #[test]
    fn deployment_listing_handles_api_group_prefix() {
        let stdout = "deployment.apps/backend-deployment\ndeployment/legacy";
        let names = parse_listing(stdout, ResourceKind::Deployment);
        assert!(names.contains("backend-deployment"));
        assert!(names.contains("legacy"));
    }

    #[test]
    fn namespace_match_is_exact() {
        assert!(listing_contains("namespace/azurephotoflow", ResourceKind::Namespace, "azurephotoflow"));
        assert!(!listing_contains(
            "namespace/azurephotoflow-staging",
            ResourceKind::Namespace,
            "azurephotoflow"
        ));
    }

    #[test]
    fn absent_namespace_issues_one_query() {
        let exec = ScriptedExecutor::new().on(
            "get namespace",
            crate::remote::CommandResult::failed(1, "Error from server (NotFound)"),
        );
        let profile = Profile::default();
        let mut report = ClusterReport::new("t");
        let inv = check_namespace(&ProbeContext::new(&exec, &profile), &mut report);
        assert!(!inv.exists);
        assert_eq!(inv, NamespaceInventory::default());
        assert_eq!(exec.call_count(), 1);
        assert_eq!(
            report.actions_needed,
            vec![ActionTag::CreateNamespace {
                namespace: "azurephotoflow".to_string()
            }]
        );
    }

    #[test]
    fn existing_namespace_lists_every_kind() {
        let exec = ScriptedExecutor::new()
            .ok("get namespace", "namespace/azurephotoflow")
            .ok("get secrets", "secret/azurephotoflow-secrets")
            .ok("get deployments", "deployment.apps/backend-deployment")
            .ok("get services", "service/backend\nservice/frontend")
            .ok("get ingress", "ingress.networking.k8s.io/web")
            .fail("get pvc");
        let profile = Profile::default();
        let mut report = ClusterReport::new("t");
        let inv = check_namespace(&ProbeContext::new(&exec, &profile), &mut report);
        assert!(inv.exists);
        assert_eq!(exec.call_count(), 6);
        assert_eq!(inv.services.len(), 2);
        assert!(inv.ingress.contains("web"));
        assert!(inv.persistent_volume_claims.is_empty());
        assert!(report.actions_needed.is_empty());
    }
}
