mod action;
mod recommendation;
mod report;

pub use action::ActionTag;
pub use recommendation::Recommendation;
pub use report::{
    AddonState, ClusterReport, DeploymentStatus, NamespaceInventory, RuntimeStatus, StorageStatus,
};
