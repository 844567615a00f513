use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

/// The label whose value identifies a workload in rule names.
pub const APP_LABEL: &str = "app";

pub type Labels = BTreeMap<String, String>;

/// Selects a group of workloads by namespace and labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSelector {
    pub namespace: String,
    pub labels: Labels,
}

/// A request to block (or unblock) traffic between two groups of workloads.
///
/// The block is bidirectional. `from` and `to` only determine which rule is
/// considered the forward direction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRequest {
    pub from: WorkloadSelector,
    pub to: WorkloadSelector,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    From,
    To,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("{0} namespace must not be empty")]
    MissingNamespace(Side),

    #[error("{0} labels must include a non-empty `{APP_LABEL}` label")]
    MissingApp(Side),
}

// === impl WorkloadSelector ===

impl WorkloadSelector {
    pub fn new<K, V>(namespace: impl Into<String>, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the workload's `app` label, if it is set and non-empty.
    pub fn app(&self) -> Option<&str> {
        self.labels
            .get(APP_LABEL)
            .map(String::as_str)
            .filter(|app| !app.is_empty())
    }

    fn validate(&self, side: Side) -> Result<&str, InvalidRequest> {
        if self.namespace.is_empty() {
            return Err(InvalidRequest::MissingNamespace(side));
        }
        self.app().ok_or(InvalidRequest::MissingApp(side))
    }
}

// === impl BlockRequest ===

impl BlockRequest {
    pub fn new(from: WorkloadSelector, to: WorkloadSelector) -> Self {
        Self { from, to }
    }

    /// Checks that both selectors are addressable and returns their `app`
    /// identities as `(from, to)`.
    pub fn apps(&self) -> Result<(&str, &str), InvalidRequest> {
        let from = self.from.validate(Side::From)?;
        let to = self.to.validate(Side::To)?;
        Ok((from, to))
    }
}

// === impl Side ===

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From => "from".fmt(f),
            Self::To => "to".fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(ns: &str, labels: &[(&str, &str)]) -> WorkloadSelector {
        WorkloadSelector::new(ns, labels.iter().copied())
    }

    #[test]
    fn apps_requires_namespaces() {
        let req = BlockRequest::new(
            selector("", &[("app", "a")]),
            selector("ns", &[("app", "b")]),
        );
        assert_eq!(req.apps(), Err(InvalidRequest::MissingNamespace(Side::From)));

        let req = BlockRequest::new(
            selector("ns", &[("app", "a")]),
            selector("", &[("app", "b")]),
        );
        assert_eq!(req.apps(), Err(InvalidRequest::MissingNamespace(Side::To)));
    }

    #[test]
    fn apps_requires_app_labels() {
        let req = BlockRequest::new(
            selector("ns-1", &[("tier", "web")]),
            selector("ns-2", &[("app", "b")]),
        );
        assert_eq!(req.apps(), Err(InvalidRequest::MissingApp(Side::From)));

        let req = BlockRequest::new(
            selector("ns-1", &[("app", "a")]),
            selector("ns-2", &[("app", "")]),
        );
        assert_eq!(req.apps(), Err(InvalidRequest::MissingApp(Side::To)));
    }

    #[test]
    fn apps_ignores_other_labels() {
        let req = BlockRequest::new(
            selector("ns-1", &[("app", "a"), ("tier", "web")]),
            selector("ns-2", &[("app", "b"), ("version", "v2")]),
        );
        assert_eq!(req.apps(), Ok(("a", "b")));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            InvalidRequest::MissingApp(Side::To).to_string(),
            "to labels must include a non-empty `app` label"
        );
        assert_eq!(
            InvalidRequest::MissingNamespace(Side::From).to_string(),
            "from namespace must not be empty"
        );
    }
}
