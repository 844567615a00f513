use crate::{
    name::BlockEdge,
    reconstruct,
    rule::{Direction, DirectionalRule, RulePair},
    selector::{BlockRequest, InvalidRequest},
    store::{CreateOutcome, DeleteOutcome, PolicyStore, RuleRef, StoreError},
};
use serde::{Serialize, Serializer};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Translates block requests into rules held by a [`PolicyStore`].
///
/// The engine holds no state; the store is the only system of record.
#[derive(Clone, Debug)]
pub struct Engine<S> {
    store: S,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    #[error("failed to create {direction} rule {}/{}: {source}", .rule.namespace, .rule.name)]
    Create {
        direction: Direction,
        rule: RuleRef,
        #[source]
        source: StoreError,
    },

    #[error("failed to list rules: {0}")]
    List(#[source] StoreError),
}

/// The result of applying one half of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub rule: RuleRef,
    pub outcome: CreateOutcome,
}

/// Acknowledges that both rules of a block exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockAck {
    pub forward: Applied,
    pub reverse: Applied,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnblockOutcome {
    Deleted,
    /// The rule did not exist, so it is already unblocked.
    NotFound,
    Error(String),
}

/// Unblock outcomes keyed by rule name.
pub type Unblocked = BTreeMap<String, UnblockOutcome>;

// === impl Engine ===

impl<S: PolicyStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates both rules of a block, forward first.
    ///
    /// A failure to create the reverse rule leaves the forward rule in place.
    /// Retrying is safe: rules that already exist are treated as created.
    pub async fn block(&self, req: &BlockRequest) -> Result<BlockAck, Error> {
        let RulePair { forward, reverse } = RulePair::synthesize(req)?;
        let forward = self.create(Direction::Forward, &forward).await?;
        let reverse = self.create(Direction::Reverse, &reverse).await?;
        Ok(BlockAck { forward, reverse })
    }

    async fn create(&self, direction: Direction, rule: &DirectionalRule) -> Result<Applied, Error> {
        let rule_ref = rule.rule_ref();
        match self.store.create_rule(rule).await {
            Ok(outcome) => {
                match outcome {
                    CreateOutcome::Created => {
                        info!(%direction, ns = %rule_ref.namespace, name = %rule_ref.name, "Created rule")
                    }
                    CreateOutcome::AlreadyExists => {
                        debug!(%direction, ns = %rule_ref.namespace, name = %rule_ref.name, "Rule already exists")
                    }
                }
                Ok(Applied {
                    rule: rule_ref,
                    outcome,
                })
            }
            Err(source) => {
                warn!(%direction, ns = %rule_ref.namespace, name = %rule_ref.name, error = %source, "Failed to create rule");
                Err(Error::Create {
                    direction,
                    rule: rule_ref,
                    source,
                })
            }
        }
    }

    /// Deletes both rules of a block.
    ///
    /// Both deletes are always attempted and each outcome is reported
    /// separately. Store failures are reported as outcomes rather than
    /// errors.
    ///
    /// When both sides share an `app`, both rules share a name. The entry for
    /// that name holds the more severe of the two outcomes, so a failure is
    /// never masked by the other direction's success.
    pub async fn unblock(&self, req: &BlockRequest) -> Result<Unblocked, Error> {
        let refs = RulePair::refs(req)?;
        let mut outcomes = Unblocked::new();
        for (direction, RuleRef { namespace, name }) in refs {
            let outcome = match self.store.delete_rule(&namespace, &name).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!(%direction, ns = %namespace, %name, "Deleted rule");
                    UnblockOutcome::Deleted
                }
                Ok(DeleteOutcome::NotFound) => {
                    debug!(%direction, ns = %namespace, %name, "Rule not found");
                    UnblockOutcome::NotFound
                }
                Err(error) => {
                    warn!(%direction, ns = %namespace, %name, %error, "Failed to delete rule");
                    UnblockOutcome::Error(error.reason().to_string())
                }
            };
            match outcomes.entry(name) {
                Entry::Vacant(entry) => {
                    entry.insert(outcome);
                }
                Entry::Occupied(mut entry) => {
                    if outcome.severity() > entry.get().severity() {
                        entry.insert(outcome);
                    }
                }
            }
        }
        Ok(outcomes)
    }

    /// Lists every stored block rule, sorted by namespace and name.
    pub async fn list_blocks(&self) -> Result<Vec<RuleRef>, Error> {
        let rules = self.store.list_rules().await.map_err(Error::List)?;
        Ok(reconstruct::block_rules(rules))
    }

    /// Lists one edge per stored block rule.
    pub async fn list_block_edges(&self) -> Result<Vec<BlockEdge>, Error> {
        let rules = self.store.list_rules().await.map_err(Error::List)?;
        Ok(reconstruct::block_edges(rules))
    }
}

// === impl BlockAck ===

impl BlockAck {
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &Applied)> {
        [
            (Direction::Forward, &self.forward),
            (Direction::Reverse, &self.reverse),
        ]
        .into_iter()
    }
}

// === impl UnblockOutcome ===

impl UnblockOutcome {
    /// Orders outcomes that share a rule name: errors before deletions before
    /// rules that were already gone.
    fn severity(&self) -> u8 {
        match self {
            Self::NotFound => 0,
            Self::Deleted => 1,
            Self::Error(_) => 2,
        }
    }
}

impl fmt::Display for UnblockOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => "deleted".fmt(f),
            Self::NotFound => "not_found".fmt(f),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

impl Serialize for UnblockOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
