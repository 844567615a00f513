use crate::{
    name::rule_name,
    selector::{BlockRequest, InvalidRequest, Labels, WorkloadSelector},
    store::RuleRef,
};
use serde::Serialize;
use std::fmt;

/// Identifies one half of a block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Egress from `from` to `to`; the rule lives in the `from` namespace.
    Forward,
    /// Egress from `to` to `from`; the rule lives in the `to` namespace.
    Reverse,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    #[default]
    Egress,
}

/// The peer that a rule denies egress to.
///
/// Egress remains allowed to any peer outside `excluded_namespace` or without
/// `app=<excluded_app>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenyTarget {
    pub excluded_namespace: String,
    pub excluded_app: String,
}

/// A single namespaced isolation rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectionalRule {
    pub name: String,
    pub namespace: String,
    pub subject: Labels,
    pub policy_kind: PolicyKind,
    pub deny_target: DenyTarget,
}

/// The two rules that implement a block.
///
/// Rules are scoped to their subject's namespace, so blocking traffic in both
/// directions takes one rule per side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePair {
    pub forward: DirectionalRule,
    pub reverse: DirectionalRule,
}

// === impl Direction ===

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => "forward".fmt(f),
            Self::Reverse => "reverse".fmt(f),
        }
    }
}

// === impl DirectionalRule ===

impl DirectionalRule {
    fn deny(
        subject: &WorkloadSelector,
        subject_app: &str,
        peer: &WorkloadSelector,
        peer_app: &str,
    ) -> Self {
        Self {
            name: rule_name(subject_app, peer_app),
            namespace: subject.namespace.clone(),
            subject: subject.labels.clone(),
            policy_kind: PolicyKind::Egress,
            deny_target: DenyTarget {
                excluded_namespace: peer.namespace.clone(),
                excluded_app: peer_app.to_string(),
            },
        }
    }

    pub fn rule_ref(&self) -> RuleRef {
        RuleRef::new(&self.namespace, &self.name)
    }
}

// === impl RulePair ===

impl RulePair {
    pub fn synthesize(req: &BlockRequest) -> Result<Self, InvalidRequest> {
        let (from_app, to_app) = req.apps()?;
        Ok(Self {
            forward: DirectionalRule::deny(&req.from, from_app, &req.to, to_app),
            reverse: DirectionalRule::deny(&req.to, to_app, &req.from, from_app),
        })
    }

    /// Returns the location of both rules without building their bodies.
    pub fn refs(req: &BlockRequest) -> Result<[(Direction, RuleRef); 2], InvalidRequest> {
        let (from_app, to_app) = req.apps()?;
        Ok([
            (
                Direction::Forward,
                RuleRef::new(&req.from.namespace, rule_name(from_app, to_app)),
            ),
            (
                Direction::Reverse,
                RuleRef::new(&req.to.namespace, rule_name(to_app, from_app)),
            ),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &DirectionalRule)> {
        [
            (Direction::Forward, &self.forward),
            (Direction::Reverse, &self.reverse),
        ]
        .into_iter()
    }
}
