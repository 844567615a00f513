//! Canonical names for directional block rules.
//!
//! A rule blocking egress from `source` to `dest` is named
//! `block-<source>-to-<dest>`, where each side is the workload's `app` label.
//! App identifiers are not escaped, so a name whose source app contains `-to-`
//! decodes at the first separator.

use serde::Serialize;
use std::fmt;

const PREFIX: &str = "block-";
const SEPARATOR: &str = "-to-";

/// Returns the name of the rule that blocks egress from `source_app` to
/// `dest_app`.
pub fn rule_name(source_app: &str, dest_app: &str) -> String {
    format!("{PREFIX}{source_app}{SEPARATOR}{dest_app}")
}

/// A source -> destination block recovered from a rule name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockEdge {
    pub source_app: String,
    pub dest_app: String,
}

// === impl BlockEdge ===

impl BlockEdge {
    pub fn new(source_app: impl Into<String>, dest_app: impl Into<String>) -> Self {
        Self {
            source_app: source_app.into(),
            dest_app: dest_app.into(),
        }
    }

    /// Decodes a rule name, returning `None` for names that were not produced
    /// by [`rule_name`].
    pub fn from_rule_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(PREFIX)?;
        let (source, dest) = rest.split_once(SEPARATOR)?;
        if source.is_empty() || dest.is_empty() {
            return None;
        }
        Some(Self::new(source, dest))
    }

    pub fn rule_name(&self) -> String {
        rule_name(&self.source_app, &self.dest_app)
    }
}

impl fmt::Display for BlockEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", self.source_app, self.dest_app)
    }
}
