use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::core::{ActionTag, ClusterReport, StorageStatus};
use crate::probes::{ProbeContext, ResourceKind};

const DEFAULT_CLASS_QUERY: &str = r#"get storageclass -o jsonpath='{.items[?(@.metadata.annotations.storageclass\.kubernetes\.io/is-default-class=="true")].metadata.name}'"#;

/// Non-numeric output counts as zero.
pub fn parse_pv_count(stdout: &str) -> u64 {
    stdout.trim().parse::<u64>().unwrap_or(0)
}

pub fn check_storage(ctx: &ProbeContext<'_>, report: &mut ClusterReport) -> StorageStatus {
    let mut storage = StorageStatus::default();

    let classes = ctx.kubectl("get storageclass -o name");
    if classes.succeeded {
        // Listing order is kept for display.
        let mut seen = BTreeSet::new();
        storage.available_classes = classes
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| ResourceKind::StorageClass.strip(l).to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();
    }

    let default = ctx.kubectl(DEFAULT_CLASS_QUERY);
    if default.has_output() {
        info!(class = default.stdout.as_str(), "default storage class");
        storage.default_storage_class = Some(default.stdout);
    } else {
        warn!("no default storage class");
        report.push_action(ActionTag::SetDefaultStorageClass);
    }

    let pv = ctx.kubectl("get pv --no-headers | wc -l");
    if pv.succeeded {
        storage.persistent_volume_count = parse_pv_count(&pv.stdout);
    }

    storage
}
