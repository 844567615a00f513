//! An in-memory [`PolicyStore`] for tests.

use crate::{
    rule::DirectionalRule,
    store::{CreateOutcome, DeleteOutcome, PolicyStore, RuleRef, StoreError},
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Holds rules in insertion order and records every call made against it.
///
/// Failures may be injected per namespace or for listing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<(RuleRef, Option<DirectionalRule>)>,
    failing_namespaces: HashMap<String, StoreError>,
    list_failure: Option<StoreError>,
    calls: Vec<Call>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create(RuleRef),
    Delete(RuleRef),
    List,
}

// === impl MemoryStore ===

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule that was not created through the store, e.g. one owned by
    /// another controller.
    pub fn insert_unmanaged(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .rules
            .push((RuleRef::new(namespace, name), None));
    }

    /// Adds a rule directly, bypassing failure injection.
    pub fn insert(&self, rule: DirectionalRule) {
        self.state.lock().rules.push((rule.rule_ref(), Some(rule)));
    }

    /// Fails every create and delete in `namespace` with `error`.
    pub fn fail_namespace(&self, namespace: &str, error: StoreError) {
        self.state
            .lock()
            .failing_namespaces
            .insert(namespace.to_string(), error);
    }

    pub fn fail_list(&self, error: StoreError) {
        self.state.lock().list_failure = Some(error);
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.failing_namespaces.clear();
        state.list_failure = None;
    }

    /// Returns the bodies of the rules created through the store, in
    /// insertion order.
    pub fn rules(&self) -> Vec<DirectionalRule> {
        self.state
            .lock()
            .rules
            .iter()
            .filter_map(|(_, rule)| rule.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }
}

#[async_trait::async_trait]
impl PolicyStore for MemoryStore {
    async fn create_rule(&self, rule: &DirectionalRule) -> Result<CreateOutcome, StoreError> {
        let mut state = self.state.lock();
        let rule_ref = rule.rule_ref();
        state.calls.push(Call::Create(rule_ref.clone()));
        if let Some(error) = state.failing_namespaces.get(&rule.namespace) {
            return Err(error.clone());
        }
        if state.rules.iter().any(|(r, _)| *r == rule_ref) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.rules.push((rule_ref, Some(rule.clone())));
        Ok(CreateOutcome::Created)
    }

    async fn delete_rule(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.state.lock();
        let rule_ref = RuleRef::new(namespace, name);
        state.calls.push(Call::Delete(rule_ref.clone()));
        if let Some(error) = state.failing_namespaces.get(namespace) {
            return Err(error.clone());
        }
        match state.rules.iter().position(|(r, _)| *r == rule_ref) {
            Some(idx) => {
                state.rules.remove(idx);
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    async fn list_rules(&self) -> Result<Vec<RuleRef>, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(Call::List);
        if let Some(error) = state.list_failure.clone() {
            return Err(error);
        }
        Ok(state.rules.iter().map(|(r, _)| r.clone()).collect())
    }
}
