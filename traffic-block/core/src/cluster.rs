//! Cluster diagnostics exposed alongside the block API.

use anyhow::Result;
use serde::Serialize;

/// The replica counts reported for a deployment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentReplicas {
    pub namespace: String,
    pub name: String,
    pub desired: Option<i32>,
    pub available: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnhealthyDeployment {
    pub name: String,
    pub namespace: String,
    pub desired: i32,
    pub available: i32,
}

#[async_trait::async_trait]
pub trait ClusterDiagnostics: Send + Sync {
    /// Returns the API server's git version, e.g. `v1.33.1`.
    async fn server_version(&self) -> Result<String>;

    async fn deployments(&self) -> Result<Vec<DeploymentReplicas>>;
}

/// Deployments default to a single replica when none is specified.
const DEFAULT_REPLICAS: i32 = 1;

/// Returns the deployments whose available replicas differ from the desired
/// count.
pub fn unhealthy_deployments(
    deployments: impl IntoIterator<Item = DeploymentReplicas>,
) -> Vec<UnhealthyDeployment> {
    deployments
        .into_iter()
        .filter_map(
            |DeploymentReplicas {
                 namespace,
                 name,
                 desired,
                 available,
             }| {
                let desired = desired.unwrap_or(DEFAULT_REPLICAS);
                let available = available.unwrap_or(0);
                (desired != available).then_some(UnhealthyDeployment {
                    name,
                    namespace,
                    desired,
                    available,
                })
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deployment(name: &str, desired: Option<i32>, available: Option<i32>) -> DeploymentReplicas {
        DeploymentReplicas {
            namespace: "ns1".to_string(),
            name: name.to_string(),
            desired,
            available,
        }
    }

    #[test]
    fn reports_mismatched_replicas() {
        let unhealthy = unhealthy_deployments(vec![
            deployment("app1", Some(3), Some(2)),
            deployment("app2", Some(2), Some(2)),
            deployment("app3", Some(1), None),
            deployment("scaled-down", Some(0), None),
            deployment("defaulted", None, Some(1)),
        ]);
        assert_eq!(
            unhealthy,
            vec![
                UnhealthyDeployment {
                    name: "app1".to_string(),
                    namespace: "ns1".to_string(),
                    desired: 3,
                    available: 2,
                },
                UnhealthyDeployment {
                    name: "app3".to_string(),
                    namespace: "ns1".to_string(),
                    desired: 1,
                    available: 0,
                },
            ]
        );
    }

    #[test]
    fn serializes_fields() {
        let json = serde_json::to_value(UnhealthyDeployment {
            name: "app1".to_string(),
            namespace: "ns1".to_string(),
            desired: 3,
            available: 2,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "app1", "namespace": "ns1", "desired": 3, "available": 2})
        );
    }
}
