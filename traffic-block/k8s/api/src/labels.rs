//! Label selectors used by block rules.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use traffic_block_core::Labels;

/// The label the API server sets on every namespace to its own name.
pub const NAMESPACE_NAME: &str = "kubernetes.io/metadata.name";

/// Marks resources created by this controller.
pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";

const NOT_IN: &str = "NotIn";

/// Selects resources that carry all of the given labels.
pub fn match_labels(labels: &Labels) -> LabelSelector {
    LabelSelector {
        match_labels: Some(labels.clone()),
        match_expressions: None,
    }
}

/// Selects resources whose `key` label is absent or not equal to `value`.
pub fn not_in(key: &str, value: &str) -> LabelSelector {
    LabelSelector {
        match_labels: None,
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: key.to_string(),
            operator: NOT_IN.to_string(),
            values: Some(vec![value.to_string()]),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn match_labels_selector() {
        let labels = btreemap! {
            "app".to_string() => "app1".to_string(),
            "tier".to_string() => "web".to_string(),
        };
        assert_eq!(
            serde_json::to_value(match_labels(&labels)).unwrap(),
            serde_json::json!({"matchLabels": {"app": "app1", "tier": "web"}})
        );
    }

    #[test]
    fn not_in_selector() {
        assert_eq!(
            serde_json::to_value(not_in("app", "app2")).unwrap(),
            serde_json::json!({
                "matchExpressions": [{"key": "app", "operator": "NotIn", "values": ["app2"]}]
            })
        );
    }
}
