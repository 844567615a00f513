#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod cluster;
mod engine;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
mod name;
mod reconstruct;
mod rule;
mod selector;
mod store;


pub use self::{
    engine::{Applied, BlockAck, Engine, Error, UnblockOutcome, Unblocked},
    name::{rule_name, BlockEdge},
    reconstruct::{block_edges, block_rules},
    rule::{DenyTarget, Direction, DirectionalRule, PolicyKind, RulePair},
    selector::{BlockRequest, InvalidRequest, Labels, Side, WorkloadSelector, APP_LABEL},
    store::{CreateOutcome, DeleteOutcome, PolicyStore, RuleRef, StoreError},
};

/// The value of the `app.kubernetes.io/managed-by` label on rules created by
/// this controller.
pub const CONTROLLER_NAME: &str = "traffic-block";
