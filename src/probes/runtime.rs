use tracing::{info, warn};

use crate::core::{ActionTag, ClusterReport, RuntimeStatus};
use crate::probes::ProbeContext;
use crate::remote::{CommandResult, first_matching, first_success};

/// Installation, version, process and client checks for the orchestration runtime.
///
/// Remote hosts differ in PATH setup and privileges, so each check tries a
/// few phrasings before giving up. When the runtime is not installed the
/// remaining checks are skipped and `installed=false` is returned.
pub fn check_runtime(ctx: &ProbeContext<'_>, report: &mut ClusterReport) -> RuntimeStatus {
    let name = ctx.profile.runtime.name.as_str();
    let abs = ctx.profile.runtime.absolute_path.as_str();
    let detect = ctx.profile.timeouts.detect();
    let query = ctx.profile.timeouts.query();
    let mut status = RuntimeStatus::default();

    let installed = first_success(
        ctx.exec,
        [
            (format!("command -v {name}"), detect),
            (format!("which {name}"), detect),
            (format!("ls {abs}"), detect),
            (format!("snap list {name}"), detect),
        ],
    );
    if !installed.succeeded {
        warn!(runtime = name, "runtime not installed");
        report.push_action(ActionTag::Install {
            runtime: name.to_string(),
        });
        return status;
    }
    status.installed = true;
    info!(runtime = name, "runtime is installed");

    let version = first_matching(
        ctx.exec,
        invocation_variants(name, abs, "version --short")
            .into_iter()
            .map(|c| (c, query)),
        CommandResult::has_output,
    );
    if version.has_output() {
        status.version = Some(version.stdout.trim().to_string());
    }

    let running = ctx.run(
        "pgrep -f 'kube-apiserver' > /dev/null && echo 'RUNNING'",
        detect,
    );
    if running.succeeded && running.stdout.contains("RUNNING") {
        status.running = true;
    } else {
        warn!(runtime = name, "api server process not detected");
        report.push_action(ActionTag::Start {
            runtime: name.to_string(),
        });
    }

    let api = first_success(
        ctx.exec,
        invocation_variants(name, abs, "kubectl version --client --output=json")
            .into_iter()
            .map(|c| (c, query)),
    );
    if api.succeeded {
        status.api_responsive = true;
    } else {
        warn!(runtime = name, "kubectl client is not responding");
        report.push_action(ActionTag::Restart {
            runtime: name.to_string(),
        });
    }

    status
}

/// Plain, absolute-path and privilege-escalated forms of the same invocation.
fn invocation_variants(name: &str, abs: &str, args: &str) -> [String; 3] {
    [
        format!("{name} {args}"),
        format!("{abs} {args}"),
        format!("sudo {name} {args}"),
    ]
}
