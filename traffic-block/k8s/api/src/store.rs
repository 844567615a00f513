use crate::{network_policy, rule_ref, FIELD_MANAGER};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use kube::{
    api::{Api, DeleteParams, ListParams, PostParams},
    Client,
};
use tracing::{debug, trace};
use traffic_block_core::{
    CreateOutcome, DeleteOutcome, DirectionalRule, PolicyStore, RuleRef, StoreError,
};

/// Stores rules as NetworkPolicy resources.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

// === impl KubeStore ===

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced(&self, ns: &str) -> Api<NetworkPolicy> {
        Api::namespaced(self.client.clone(), ns)
    }
}

#[async_trait::async_trait]
impl PolicyStore for KubeStore {
    async fn create_rule(&self, rule: &DirectionalRule) -> Result<CreateOutcome, StoreError> {
        let policy = network_policy(rule);
        trace!(?policy);
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let api = self.namespaced(&rule.namespace);
        match api.create(&params, &policy).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(rsp)) if rsp.code == 409 => {
                debug!(ns = %rule.namespace, name = %rule.name, message = %rsp.message, "NetworkPolicy already exists");
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(error) => Err(store_error(error)),
        }
    }

    async fn delete_rule(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        match self
            .namespaced(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(kube::Error::Api(rsp)) if rsp.code == 404 => Ok(DeleteOutcome::NotFound),
            Err(error) => Err(store_error(error)),
        }
    }

    async fn list_rules(&self) -> Result<Vec<RuleRef>, StoreError> {
        let policies = Api::<NetworkPolicy>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(store_error)?;
        debug!(count = policies.items.len(), "Listed NetworkPolicies");
        Ok(policies.items.iter().map(rule_ref).collect())
    }
}

fn store_error(error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(rsp) => StoreError::Api {
            code: rsp.code,
            reason: rsp.reason,
            message: rsp.message,
        },
        error => StoreError::Client(error.to_string()),
    }
}
