use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One remediation step, serialized as its short tag (`install_microk8s`, `create_secret:x`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ActionTag {
    Install { runtime: String },
    Start { runtime: String },
    Restart { runtime: String },
    EnableAddons { addons: Vec<String> },
    CreateNamespace { namespace: String },
    CreateSecret { secret: String },
    SetDefaultStorageClass,
}

impl ActionTag {
    /// Only a missing or stopped runtime keeps the cluster from being ready.
    pub fn blocks_readiness(&self) -> bool {
        matches!(self, ActionTag::Install { .. } | ActionTag::Start { .. })
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTag::Install { runtime } => write!(f, "install_{runtime}"),
            ActionTag::Start { runtime } => write!(f, "start_{runtime}"),
            ActionTag::Restart { runtime } => write!(f, "restart_{runtime}"),
            ActionTag::EnableAddons { addons } => write!(f, "enable_addons:{}", addons.join(",")),
            ActionTag::CreateNamespace { namespace } => write!(f, "create_namespace:{namespace}"),
            ActionTag::CreateSecret { secret } => write!(f, "create_secret:{secret}"),
            ActionTag::SetDefaultStorageClass => f.write_str("set_default_storage_class"),
        }
    }
}

impl FromStr for ActionTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "set_default_storage_class" {
            return Ok(ActionTag::SetDefaultStorageClass);
        }
        if let Some((kind, arg)) = s.split_once(':') {
            return match kind {
                "enable_addons" => Ok(ActionTag::EnableAddons {
                    addons: arg
                        .split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string)
                        .collect(),
                }),
                "create_namespace" => Ok(ActionTag::CreateNamespace {
                    namespace: arg.to_string(),
                }),
                "create_secret" => Ok(ActionTag::CreateSecret {
                    secret: arg.to_string(),
                }),
                _ => Err(format!("unknown action tag: {s}")),
            };
        }
        // `restart_` must be tried before `start_`.
        if let Some(runtime) = s.strip_prefix("restart_") {
            return Ok(ActionTag::Restart {
                runtime: runtime.to_string(),
            });
        }
        if let Some(runtime) = s.strip_prefix("start_") {
            return Ok(ActionTag::Start {
                runtime: runtime.to_string(),
            });
        }
        if let Some(runtime) = s.strip_prefix("install_") {
            return Ok(ActionTag::Install {
                runtime: runtime.to_string(),
            });
        }
        Err(format!("unknown action tag: {s}"))
    }
}

impl From<ActionTag> for String {
    fn from(tag: ActionTag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for ActionTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_render_like_the_pipeline_expects() {
        let tags = vec![
            ActionTag::Install {
                runtime: "microk8s".to_string(),
            },
            ActionTag::EnableAddons {
                addons: vec!["dns".to_string(), "ingress".to_string()],
            },
            ActionTag::CreateNamespace {
                namespace: "azurephotoflow".to_string(),
            },
            ActionTag::SetDefaultStorageClass,
        ];
        let json = serde_json::to_value(&tags).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([
                "install_microk8s",
                "enable_addons:dns,ingress",
                "create_namespace:azurephotoflow",
                "set_default_storage_class"
            ])
        );
    }

    #[test]
    fn restart_is_not_mistaken_for_start() {
        let tag: ActionTag = "restart_microk8s".parse().expect("parse");
        assert_eq!(
            tag,
            ActionTag::Restart {
                runtime: "microk8s".to_string()
            }
        );
        assert!(!tag.blocks_readiness());
        assert!("start_microk8s".parse::<ActionTag>().expect("parse").blocks_readiness());
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!("reboot_host".parse::<ActionTag>().is_err());
        assert!("frobnicate:x".parse::<ActionTag>().is_err());
    }
}
