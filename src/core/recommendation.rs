use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Recommendation {
    FullDeploymentNoNamespace,
    FullDeploymentNoDeployments,
    UpdateDeployment,
    PartialDeployment,
    CreateSecrets,
    CreateRegistrySecret,
    EnableAddons,
}

impl Recommendation {
    pub const fn code(self) -> &'static str {
        match self {
            Recommendation::FullDeploymentNoNamespace
            | Recommendation::FullDeploymentNoDeployments => "FULL_DEPLOYMENT",
            Recommendation::UpdateDeployment => "UPDATE_DEPLOYMENT",
            Recommendation::PartialDeployment => "PARTIAL_DEPLOYMENT",
            Recommendation::CreateSecrets => "CREATE_SECRETS",
            Recommendation::CreateRegistrySecret => "CREATE_REGISTRY_SECRET",
            Recommendation::EnableAddons => "ENABLE_ADDONS",
        }
    }

    pub const fn detail(self) -> &'static str {
        match self {
            Recommendation::FullDeploymentNoNamespace => {
                "Namespace doesn't exist - full deployment needed"
            }
            Recommendation::FullDeploymentNoDeployments => {
                "No existing deployments - full deployment needed"
            }
            Recommendation::UpdateDeployment => {
                "All deployments exist and ready - update images only"
            }
            Recommendation::PartialDeployment => "Some deployments missing or not ready",
            Recommendation::CreateSecrets => "Application secrets missing",
            Recommendation::CreateRegistrySecret => "Registry secret missing",
            Recommendation::EnableAddons => "Required addons missing",
        }
    }

    /// The deployment strategy classes; exactly one of these is emitted per report.
    pub const fn is_primary(self) -> bool {
        matches!(
            self,
            Recommendation::FullDeploymentNoNamespace
                | Recommendation::FullDeploymentNoDeployments
                | Recommendation::UpdateDeployment
                | Recommendation::PartialDeployment
        )
    }

    const ALL: [Recommendation; 7] = [
        Recommendation::FullDeploymentNoNamespace,
        Recommendation::FullDeploymentNoDeployments,
        Recommendation::UpdateDeployment,
        Recommendation::PartialDeployment,
        Recommendation::CreateSecrets,
        Recommendation::CreateRegistrySecret,
        Recommendation::EnableAddons,
    ];
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.detail())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(found) = Recommendation::ALL.iter().find(|r| r.to_string() == s) {
            return Ok(*found);
        }
        let code = s.split(':').next().unwrap_or(s).trim();
        Recommendation::ALL
            .iter()
            .find(|r| r.code() == code)
            .copied()
            .ok_or_else(|| format!("unknown recommendation: {s}"))
    }
}

impl From<Recommendation> for String {
    fn from(r: Recommendation) -> Self {
        r.to_string()
    }
}

impl TryFrom<String> for Recommendation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
