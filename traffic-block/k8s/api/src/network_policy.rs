use crate::labels;
use k8s_openapi::{
    api::networking::v1::{
        NetworkPolicy, NetworkPolicyEgressRule, NetworkPolicyPeer, NetworkPolicySpec,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::ResourceExt;
use traffic_block_core::{DirectionalRule, PolicyKind, RuleRef, APP_LABEL, CONTROLLER_NAME};

/// Renders a rule as a NetworkPolicy.
///
/// The policy selects the rule's subject pods and allows egress only to peers
/// that are outside the excluded namespace or lack the excluded app label.
/// Traffic to the excluded workload is denied as a consequence.
pub fn network_policy(rule: &DirectionalRule) -> NetworkPolicy {
    let DirectionalRule {
        name,
        namespace,
        subject,
        policy_kind,
        deny_target,
    } = rule;

    let peer = NetworkPolicyPeer {
        namespace_selector: Some(labels::not_in(
            labels::NAMESPACE_NAME,
            &deny_target.excluded_namespace,
        )),
        pod_selector: Some(labels::not_in(APP_LABEL, &deny_target.excluded_app)),
        ..Default::default()
    };

    NetworkPolicy {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.clone()),
            labels: Some(
                [(labels::MANAGED_BY.to_string(), CONTROLLER_NAME.to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        },
        spec: Some(NetworkPolicySpec {
            pod_selector: labels::match_labels(subject).into(),
            policy_types: Some(vec![policy_type(*policy_kind).to_string()]),
            egress: Some(vec![NetworkPolicyEgressRule {
                to: Some(vec![peer]),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Returns the location of a listed NetworkPolicy.
pub fn rule_ref(policy: &NetworkPolicy) -> RuleRef {
    RuleRef::new(policy.namespace().unwrap_or_default(), policy.name_any())
}

fn policy_type(kind: PolicyKind) -> &'static str {
    match kind {
        PolicyKind::Egress => "Egress",
    }
}
