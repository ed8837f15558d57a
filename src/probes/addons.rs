use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::{ActionTag, AddonState, ClusterReport};
use crate::probes::ProbeContext;

/// The two shapes the runtime's status command is known to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonStatusFormat {
    /// `{"addons": {"enabled": [..], "disabled": [..]}}`
    Json,
    /// One `<name>: enabled|disabled` per line.
    Legacy,
}

#[derive(Debug, Deserialize)]
struct JsonStatus {
    addons: JsonAddons,
}

#[derive(Debug, Default, Deserialize)]
struct JsonAddons {
    #[serde(default)]
    enabled: Vec<JsonAddon>,
    #[serde(default)]
    disabled: Vec<JsonAddon>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonAddon {
    Name(String),
    Entry { name: String },
}

impl JsonAddon {
    fn into_name(self) -> String {
        match self {
            JsonAddon::Name(name) | JsonAddon::Entry { name } => name,
        }
    }
}

impl AddonStatusFormat {
    /// Structured output is recognised by parsing, not by which command produced it.
    pub fn detect(stdout: &str) -> Self {
        if serde_json::from_str::<JsonStatus>(stdout.trim()).is_ok() {
            AddonStatusFormat::Json
        } else {
            AddonStatusFormat::Legacy
        }
    }
}

pub fn parse_addon_status(format: AddonStatusFormat, stdout: &str) -> BTreeMap<String, AddonState> {
    match format {
        AddonStatusFormat::Json => parse_json(stdout).unwrap_or_default(),
        AddonStatusFormat::Legacy => parse_legacy(stdout),
    }
}

fn parse_json(stdout: &str) -> Option<BTreeMap<String, AddonState>> {
    let status: JsonStatus = serde_json::from_str(stdout.trim()).ok()?;
    let mut out = BTreeMap::new();
    for addon in status.addons.disabled {
        out.insert(addon.into_name(), AddonState::Disabled);
    }
    for addon in status.addons.enabled {
        out.insert(addon.into_name(), AddonState::Enabled);
    }
    Some(out)
}

fn parse_legacy(stdout: &str) -> BTreeMap<String, AddonState> {
    let mut out = BTreeMap::new();
    for line in stdout.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            continue;
        }
        let state = match rest.split_whitespace().next() {
            Some("enabled") => AddonState::Enabled,
            Some("disabled") => AddonState::Disabled,
            _ => continue,
        };
        out.insert(name.to_string(), state);
    }
    out
}

/// Reads add-on states, preferring structured output, and flags missing required add-ons.
///
/// All missing required add-ons share a single `enable_addons:` action.
/// Optional add-ons are only logged.
pub fn check_addons(ctx: &ProbeContext<'_>, report: &mut ClusterReport) -> BTreeMap<String, AddonState> {
    let runtime = ctx.profile.runtime.name.as_str();
    let mut result = ctx.run(
        &format!("{runtime} status --format json"),
        ctx.profile.timeouts.addon_status(),
    );
    if !result.succeeded {
        debug!("structured add-on status unavailable, falling back to plain status");
        result = ctx.run(&format!("{runtime} status"), ctx.profile.timeouts.query());
    }

    let addons = if result.has_output() {
        parse_addon_status(AddonStatusFormat::detect(&result.stdout), &result.stdout)
    } else {
        BTreeMap::new()
    };

    let is_enabled = |addon: &str| {
        ctx.profile
            .addon_names(addon)
            .iter()
            .any(|n| addons.get(*n) == Some(&AddonState::Enabled))
    };

    let missing: Vec<String> = ctx
        .profile
        .cluster
        .required_addons
        .iter()
        .filter(|a| !is_enabled(a.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        warn!(missing = %missing.join(","), "required add-ons are not enabled");
        report.push_action(ActionTag::EnableAddons { addons: missing });
    }

    for addon in &ctx.profile.cluster.optional_addons {
        info!(addon = addon.as_str(), enabled = is_enabled(addon.as_str()), "optional add-on");
    }

    addons
}
