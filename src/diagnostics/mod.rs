use std::time::Duration;

use tracing::{info, warn};

use crate::config::Profile;
use crate::remote::RemoteExecutor;

pub const FIRST_WAIT_SECS: u64 = 15;
pub const RESTART_WAIT_SECS: u64 = 60;

/// Slack added on top of `--timeout` so the remote wait expires before the transport does.
const WAIT_MARGIN: Duration = Duration::from_secs(10);
const RESTART_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsOutcome {
    Ready,
    Recovered,
    Failed,
}

impl DiagnosticsOutcome {
    pub fn is_ready(self) -> bool {
        !matches!(self, DiagnosticsOutcome::Failed)
    }
}

pub fn runtime_ready(exec: &dyn RemoteExecutor, runtime: &str, wait_secs: u64) -> bool {
    let command = format!("{runtime} status --wait-ready --timeout={wait_secs}");
    exec.execute(&command, Duration::from_secs(wait_secs) + WAIT_MARGIN)
        .succeeded
}

/// Readiness probe, then at most one stop/start cycle followed by a longer probe.
pub fn run_quick_diagnostics(exec: &dyn RemoteExecutor, profile: &Profile) -> DiagnosticsOutcome {
    let runtime = profile.runtime.name.as_str();
    if runtime_ready(exec, runtime, FIRST_WAIT_SECS) {
        info!(runtime, "runtime is ready");
        return DiagnosticsOutcome::Ready;
    }

    warn!(runtime, "runtime not ready, restarting");
    let restart = exec.execute(&format!("{runtime} stop && {runtime} start"), RESTART_TIMEOUT);
    if !restart.succeeded {
        // The second probe decides.
        warn!(runtime, stderr = restart.stderr.as_str(), "restart command failed");
    }

    if runtime_ready(exec, runtime, RESTART_WAIT_SECS) {
        info!(runtime, "runtime recovered after restart");
        DiagnosticsOutcome::Recovered
    } else {
        DiagnosticsOutcome::Failed
    }
}
