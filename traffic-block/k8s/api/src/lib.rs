#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cluster;
pub mod labels;
mod network_policy;
mod store;

pub use self::{
    cluster::KubeCluster,
    network_policy::{network_policy, rule_ref},
    store::KubeStore,
};
pub use k8s_openapi::api::{self, apps::v1::Deployment, networking::v1::NetworkPolicy};
pub use kube::{
    api::{Api, ObjectMeta, ResourceExt},
    Client, Error,
};

/// The field manager recorded on rules created by this controller.
pub const FIELD_MANAGER: &str = "traffic-block";
