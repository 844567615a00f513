use anyhow::Result;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::{Api, ListParams},
    Client, ResourceExt,
};
use traffic_block_core::cluster::{ClusterDiagnostics, DeploymentReplicas};

/// Reads cluster diagnostics from the API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

// === impl KubeCluster ===

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ClusterDiagnostics for KubeCluster {
    async fn server_version(&self) -> Result<String> {
        let info = self.client.apiserver_version().await?;
        Ok(info.git_version)
    }

    async fn deployments(&self) -> Result<Vec<DeploymentReplicas>> {
        let deployments = Api::<Deployment>::all(self.client.clone())
            .list(&ListParams::default())
            .await?;
        Ok(deployments.items.iter().map(replicas).collect())
    }
}

fn replicas(deployment: &Deployment) -> DeploymentReplicas {
    DeploymentReplicas {
        namespace: deployment.namespace().unwrap_or_default(),
        name: deployment.name_any(),
        desired: deployment.spec.as_ref().and_then(|spec| spec.replicas),
        available: deployment
            .status
            .as_ref()
            .and_then(|status| status.available_replicas),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::{
        api::apps::v1::{DeploymentSpec, DeploymentStatus},
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };

    #[test]
    fn reads_replica_counts() {
        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some("app1".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(3),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                available_replicas: Some(2),
                ..Default::default()
            }),
        };
        assert_eq!(
            replicas(&deployment),
            DeploymentReplicas {
                namespace: "ns1".to_string(),
                name: "app1".to_string(),
                desired: Some(3),
                available: Some(2),
            }
        );
    }

    #[test]
    fn missing_status() {
        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some("app2".to_string()),
                namespace: Some("ns2".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let replicas = replicas(&deployment);
        assert_eq!(replicas.desired, None);
        assert_eq!(replicas.available, None);
    }
}
