use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::remote::RemoteTarget;

pub const DEFAULT_OUTPUT_FILE: &str = "cluster-config.json";
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Where configuration values come from, so resolution can be tested without touching the process env.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;

    /// Non-empty, trimmed value.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionFlags {
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub key: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub target: RemoteTarget,
    pub output: PathBuf,
}

/// flag > primary env var > legacy env var > default.
pub fn resolve_connection(flags: &ConnectionFlags, env: &dyn EnvSource) -> Result<ConnectionSettings> {
    let host = first_of(flags.host.as_deref(), env, &["SSH_HOST", "REMOTE_SSH_HOST"]);
    let user = first_of(flags.user.as_deref(), env, &["SSH_USER", "REMOTE_SSH_USER"]);

    let (Some(host), Some(user)) = (host, user) else {
        return Err(crate::exit::invalid_args(
            "SSH host and user are required\n\
             Options:\n  \
             1. Use command line: clustercheck -h HOST -u USER\n  \
             2. Set environment: SSH_HOST=host SSH_USER=user clustercheck\n  \
             3. Run with --help for full usage information",
        ));
    };

    let port = match flags.port {
        Some(port) => port,
        None => match env.non_empty("SSH_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("SSH_PORT is not a valid port: {v}"))
                .map_err(crate::exit::invalid_args_err)?,
            None => DEFAULT_SSH_PORT,
        },
    };

    let key_path = flags
        .key
        .clone()
        .filter(|k| !k.as_os_str().is_empty())
        .or_else(|| env.non_empty("SSH_KEY").map(PathBuf::from));

    let output = flags
        .output
        .clone()
        .or_else(|| env.non_empty("CONFIG_OUTPUT_FILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

    Ok(ConnectionSettings {
        target: RemoteTarget {
            host,
            user,
            key_path,
            port,
        },
        output,
    })
}

fn first_of(flag: Option<&str>, env: &dyn EnvSource, keys: &[&str]) -> Option<String> {
    flag.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| keys.iter().find_map(|k| env.non_empty(k)))
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub runtime: RuntimeConfig,
    pub cluster: ClusterConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfig {
    pub name: String,
    pub absolute_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterConfig {
    pub namespace: String,
    pub app_secret: String,
    pub registry_secret: String,
    pub deployments: Vec<String>,
    pub required_addons: Vec<String>,
    pub optional_addons: Vec<String>,
    pub addon_aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeoutConfig {
    pub connectivity_secs: u64,
    pub detect_secs: u64,
    pub query_secs: u64,
    pub addon_status_secs: u64,
}

impl TimeoutConfig {
    pub fn connectivity(&self) -> Duration {
        Duration::from_secs(self.connectivity_secs)
    }

    pub fn detect(&self) -> Duration {
        Duration::from_secs(self.detect_secs)
    }

    pub fn query(&self) -> Duration {
        Duration::from_secs(self.query_secs)
    }

    pub fn addon_status(&self) -> Duration {
        Duration::from_secs(self.addon_status_secs)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            config_path: None,
            runtime: RuntimeConfig {
                name: "microk8s".to_string(),
                absolute_path: "/snap/bin/microk8s".to_string(),
            },
            cluster: ClusterConfig {
                namespace: "azurephotoflow".to_string(),
                app_secret: "azurephotoflow-secrets".to_string(),
                registry_secret: "registry-secret".to_string(),
                deployments: [
                    "backend-deployment",
                    "frontend-deployment",
                    "minio-deployment",
                    "qdrant-deployment",
                ]
                .map(str::to_string)
                .to_vec(),
                required_addons: ["dns", "storage", "ingress"].map(str::to_string).to_vec(),
                optional_addons: ["cert-manager", "metrics-server", "registry"]
                    .map(str::to_string)
                    .to_vec(),
                addon_aliases: BTreeMap::from([(
                    "storage".to_string(),
                    vec!["hostpath-storage".to_string()],
                )]),
            },
            timeouts: TimeoutConfig {
                connectivity_secs: 10,
                detect_secs: 5,
                query_secs: 10,
                addon_status_secs: 15,
            },
        }
    }
}

impl Profile {
    /// Orchestration CLI prefix, e.g. `microk8s kubectl`.
    pub fn kubectl(&self) -> String {
        format!("{} kubectl", self.runtime.name)
    }

    /// Every name an add-on may be reported under, itself first.
    pub fn addon_names<'a>(&'a self, addon: &'a str) -> Vec<&'a str> {
        let mut names = vec![addon];
        if let Some(aliases) = self.cluster.addon_aliases.get(addon) {
            names.extend(aliases.iter().map(String::as_str));
        }
        names
    }

    pub fn required_secrets(&self) -> [&str; 2] {
        [
            self.cluster.app_secret.as_str(),
            self.cluster.registry_secret.as_str(),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    runtime: Option<RawRuntimeConfig>,
    cluster: Option<RawClusterConfig>,
    timeouts: Option<RawTimeoutConfig>,
}

#[derive(Debug, Deserialize)]
struct RawRuntimeConfig {
    name: Option<String>,
    absolute_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClusterConfig {
    namespace: Option<String>,
    app_secret: Option<String>,
    registry_secret: Option<String>,
    deployments: Option<Vec<String>>,
    required_addons: Option<Vec<String>>,
    optional_addons: Option<Vec<String>>,
    addon_aliases: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct RawTimeoutConfig {
    connectivity_secs: Option<u64>,
    detect_secs: Option<u64>,
    query_secs: Option<u64>,
    addon_status_secs: Option<u64>,
}

pub fn default_config_path(env: &dyn EnvSource) -> Option<PathBuf> {
    env.non_empty("HOME")
        .map(|home| Path::new(&home).join(".config/clustercheck/config.toml"))
}

/// Loads the cluster profile. An explicit path must exist; the default path is optional.
pub fn load(config_path: Option<&Path>, env: &dyn EnvSource) -> Result<Profile> {
    let mut cfg = Profile::default();

    let explicit = config_path
        .map(ToOwned::to_owned)
        .or_else(|| env.non_empty("CLUSTERCHECK_CONFIG").map(PathBuf::from));
    let path = match explicit {
        Some(path) => Some(path),
        None => default_config_path(env).filter(|p| p.exists()),
    };

    if let Some(path) = path {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg, env);

    if cfg.cluster.namespace.trim().is_empty() {
        anyhow::bail!("cluster.namespace must not be empty");
    }
    if cfg.runtime.name.trim().is_empty() {
        anyhow::bail!("runtime.name must not be empty");
    }

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut Profile, raw: RawConfig) {
    if let Some(runtime) = raw.runtime {
        if let Some(name) = runtime.name {
            cfg.runtime.name = name;
        }
        if let Some(absolute_path) = runtime.absolute_path {
            cfg.runtime.absolute_path = absolute_path;
        }
    }

    if let Some(cluster) = raw.cluster {
        if let Some(namespace) = cluster.namespace {
            cfg.cluster.namespace = namespace;
        }
        if let Some(app_secret) = cluster.app_secret {
            cfg.cluster.app_secret = app_secret;
        }
        if let Some(registry_secret) = cluster.registry_secret {
            cfg.cluster.registry_secret = registry_secret;
        }
        if let Some(deployments) = cluster.deployments {
            cfg.cluster.deployments = deployments;
        }
        if let Some(required_addons) = cluster.required_addons {
            cfg.cluster.required_addons = required_addons;
        }
        if let Some(optional_addons) = cluster.optional_addons {
            cfg.cluster.optional_addons = optional_addons;
        }
        if let Some(addon_aliases) = cluster.addon_aliases {
            cfg.cluster.addon_aliases = addon_aliases;
        }
    }

    if let Some(timeouts) = raw.timeouts {
        if let Some(v) = timeouts.connectivity_secs {
            cfg.timeouts.connectivity_secs = v;
        }
        if let Some(v) = timeouts.detect_secs {
            cfg.timeouts.detect_secs = v;
        }
        if let Some(v) = timeouts.query_secs {
            cfg.timeouts.query_secs = v;
        }
        if let Some(v) = timeouts.addon_status_secs {
            cfg.timeouts.addon_status_secs = v;
        }
    }
}

fn apply_env_overrides(cfg: &mut Profile, env: &dyn EnvSource) {
    if let Some(v) = env.non_empty("CLUSTERCHECK_NAMESPACE") {
        cfg.cluster.namespace = v;
    }
    if let Some(v) = env.non_empty("CLUSTERCHECK_DEPLOYMENTS") {
        let parts: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if !parts.is_empty() {
            cfg.cluster.deployments = parts;
        }
    }
}
