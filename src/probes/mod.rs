//! Probe stages. Each stage issues remote commands through [`ProbeContext`],
//! records its findings into the caller's [`crate::core::ClusterReport`] and
//! appends action tags for anything that needs remediation.

mod addons;
mod connectivity;
mod deployments;
mod namespace;
mod runtime;
mod secrets;
mod storage;

use std::time::Duration;

use crate::config::Profile;
use crate::remote::{CommandResult, RemoteExecutor};

pub use addons::{AddonStatusFormat, check_addons, parse_addon_status};
pub use connectivity::{CONNECTIVITY_TOKEN, check_connectivity};
pub use deployments::{check_deployments, parse_deployment_status};
pub use namespace::{ResourceKind, check_namespace, listing_contains, parse_listing};
pub use runtime::check_runtime;
pub use secrets::check_secrets;
pub use storage::{check_storage, parse_pv_count};

pub struct ProbeContext<'a> {
    pub exec: &'a dyn RemoteExecutor,
    pub profile: &'a Profile,
}

impl<'a> ProbeContext<'a> {
    pub fn new(exec: &'a dyn RemoteExecutor, profile: &'a Profile) -> Self {
        Self { exec, profile }
    }

    pub fn run(&self, command: &str, timeout: Duration) -> CommandResult {
        self.exec.execute(command, timeout)
    }

    /// `<runtime> kubectl <args>` with the query timeout.
    pub fn kubectl(&self, args: &str) -> CommandResult {
        let command = format!("{} {args}", self.profile.kubectl());
        self.run(&command, self.profile.timeouts.query())
    }

    pub fn namespace(&self) -> &str {
        &self.profile.cluster.namespace
    }
}
