use anyhow::Error;
use std::io::{self, Write};
use std::path::Path;

use crate::core::{AddonState, ClusterReport};

#[derive(Debug, Clone, Default)]
pub struct UiConfig {
    pub color: bool,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(stderr, "  - check your SSH connection and credentials");
    let _ = writeln!(stderr, "  - re-run with `--verbose` to see every remote command");
    let _ = writeln!(stderr, "  - see `clustercheck --help` for options");
}

pub fn eprintln_cancelled() {
    let _ = writeln!(io::stderr().lock(), "\nOperation cancelled by user");
}

pub fn print_target(cfg: &UiConfig, target: &str, key: Option<&Path>, output: &Path) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "Target: {target}");
    if let Some(key) = key {
        let _ = writeln!(out, "SSH key: {}", key.display());
    }
    let _ = writeln!(out, "Output file: {}", output.display());
    let _ = writeln!(out);
}

pub fn print_summary(report: &ClusterReport, cfg: &UiConfig, output: &Path, connectivity_error: Option<&str>) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    render_summary(&mut out, report, cfg, output, connectivity_error);
}

pub fn render_summary(
    out: &mut dyn Write,
    report: &ClusterReport,
    cfg: &UiConfig,
    output: &Path,
    connectivity_error: Option<&str>,
) {
    if let Some(reason) = connectivity_error {
        let _ = writeln!(out, "{} SSH connection failed: {reason}", mark(false, cfg.color));
    }

    if let Some(rt) = &report.runtime_status {
        let _ = writeln!(out, "Runtime:");
        let _ = writeln!(out, "  {} installed", mark(rt.installed, cfg.color));
        if rt.installed {
            let _ = writeln!(out, "  {} processes running", mark(rt.running, cfg.color));
            let _ = writeln!(out, "  {} kubectl responsive", mark(rt.api_responsive, cfg.color));
            if let Some(v) = &rt.version {
                let _ = writeln!(out, "  version: {v}");
            }
        }
    }

    if !report.addons.is_empty() {
        let enabled: Vec<&str> = report
            .addons
            .iter()
            .filter(|(_, s)| **s == AddonState::Enabled)
            .map(|(n, _)| n.as_str())
            .collect();
        let _ = writeln!(out, "Add-ons enabled: {}", enabled.join(", "));
    }

    if let Some(ns) = &report.namespace {
        let _ = writeln!(out, "Namespace:");
        let _ = writeln!(out, "  {} exists", mark(ns.exists, cfg.color));
        if ns.exists {
            let _ = writeln!(
                out,
                "  found: {} secrets, {} deployments, {} services, {} ingress, {} pvcs",
                ns.secrets.len(),
                ns.deployments.len(),
                ns.services.len(),
                ns.ingress.len(),
                ns.persistent_volume_claims.len()
            );
        }
    }

    if !report.deployments.is_empty() {
        let _ = writeln!(out, "Deployments:");
        let width = report.deployments.keys().map(String::len).max().unwrap_or(0);
        for (name, d) in &report.deployments {
            let _ = writeln!(
                out,
                "  {} {name:<width$}  {}",
                mark(d.ready, cfg.color),
                d.raw_status_text
            );
        }
    }

    if let Some(storage) = &report.storage {
        let _ = writeln!(
            out,
            "Storage: default={}  classes={}  persistent_volumes={}",
            storage.default_storage_class.as_deref().unwrap_or("-"),
            storage.available_classes.len(),
            storage.persistent_volume_count
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "CLUSTER CONFIGURATION SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(60));
    if report.cluster_ready {
        let _ = writeln!(out, "{} Cluster is ready for deployment", mark(true, cfg.color));
    } else {
        let _ = writeln!(out, "{} Cluster needs preparation", paint("!!", "33", cfg.color));
    }
    if cfg.verbose {
        let _ = writeln!(out, "Checked {} in {:.1}s", report.target, report.elapsed_ms as f64 / 1000.0);
    }

    if !report.actions_needed.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Actions needed:");
        for action in &report.actions_needed {
            let _ = writeln!(out, "  - {action}");
        }
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Deployment recommendations:");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  - {rec}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Detailed results saved to: {}", output.display());
}

fn mark(ok: bool, color: bool) -> String {
    if ok {
        paint("ok", "32", color)
    } else {
        paint("--", "31", color)
    }
}

fn paint(s: &str, code: &str, color: bool) -> String {
    if !color {
        return format!("[{s}]");
    }
    format!("\x1b[{code}m[{s}]\x1b[0m")
}
