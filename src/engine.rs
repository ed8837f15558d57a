use std::time::{Duration, Instant};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::config::Profile;
use crate::core::ClusterReport;
use crate::probes::{self, ProbeContext};
use crate::recommend;
use crate::remote::RemoteExecutor;

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub show_progress: bool,
}

/// Runs the probe stages in their fixed order against one target.
pub struct Engine<'a> {
    exec: &'a dyn RemoteExecutor,
    profile: &'a Profile,
    target: String,
    opts: EngineOptions,
}

/// A finished check. `connectivity_error` is set when the run stopped at the first stage.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub report: ClusterReport,
    pub connectivity_error: Option<String>,
}

impl<'a> Engine<'a> {
    pub fn new(
        exec: &'a dyn RemoteExecutor,
        profile: &'a Profile,
        target: impl Into<String>,
        opts: EngineOptions,
    ) -> Self {
        Self {
            exec,
            profile,
            target: target.into(),
            opts,
        }
    }

    pub fn check(&self) -> CheckOutcome {
        let started = Instant::now();
        let ctx = ProbeContext::new(self.exec, self.profile);
        let mut report = ClusterReport::new(self.target.clone());
        let progress = Progress::new(self.opts.show_progress);

        progress.stage("checking ssh connectivity...");
        if let Err(reason) = probes::check_connectivity(&ctx) {
            warn!(host = self.target.as_str(), reason = reason.as_str(), "ssh connection failed");
            progress.finish();
            stamp(&mut report, started);
            return CheckOutcome {
                report,
                connectivity_error: Some(reason),
            };
        }

        progress.stage(&format!("checking {} status...", self.profile.runtime.name));
        let runtime = probes::check_runtime(&ctx, &mut report);
        let installed = runtime.installed;
        report.runtime_status = Some(runtime);
        if !installed {
            progress.finish();
            stamp(&mut report, started);
            return CheckOutcome {
                report,
                connectivity_error: None,
            };
        }

        progress.stage("checking add-ons...");
        report.addons = probes::check_addons(&ctx, &mut report);

        progress.stage(&format!("checking namespace '{}'...", self.profile.cluster.namespace));
        report.namespace = Some(probes::check_namespace(&ctx, &mut report));

        progress.stage("checking secrets...");
        report.secrets_present = probes::check_secrets(&ctx, &mut report);

        progress.stage("checking deployments...");
        report.deployments = probes::check_deployments(&ctx, &report);

        progress.stage("checking storage...");
        report.storage = Some(probes::check_storage(&ctx, &mut report));

        progress.finish();
        recommend::finalize(&mut report, self.profile);
        stamp(&mut report, started);
        info!(
            ready = report.cluster_ready,
            actions = report.actions_needed.len(),
            elapsed_ms = report.elapsed_ms,
            "configuration check completed"
        );

        CheckOutcome {
            report,
            connectivity_error: None,
        }
    }
}

fn stamp(report: &mut ClusterReport, started: Instant) {
    report.generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
}

struct Progress(Option<indicatif::ProgressBar>);

impl Progress {
    fn new(enabled: bool) -> Self {
        use std::io::IsTerminal;
        if !enabled || !std::io::stderr().is_terminal() {
            return Self(None);
        }
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.enable_steady_tick(Duration::from_millis(120));
        Self(Some(pb))
    }

    fn stage(&self, message: &str) {
        if let Some(pb) = &self.0 {
            pb.set_message(message.to_string());
        }
    }

    fn finish(&self) {
        if let Some(pb) = &self.0 {
            pb.finish_and_clear();
        }
    }
}
