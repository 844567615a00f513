use crate::rule::DirectionalRule;
use serde::Serialize;
use thiserror::Error;

/// Locates a stored rule.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RuleRef {
    pub namespace: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A rule with the same name already exists in the namespace.
    AlreadyExists,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store rejected the request.
    #[error("{reason} ({code}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// The request could not be completed.
    #[error("{0}")]
    Client(String),
}

/// The system of record for isolation rules.
///
/// Each operation must be atomic with respect to a single rule; the engine
/// performs no synchronization of its own.
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    async fn create_rule(&self, rule: &DirectionalRule) -> Result<CreateOutcome, StoreError>;

    async fn delete_rule(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError>;

    /// Lists every rule in the store, including rules this controller did
    /// not create.
    async fn list_rules(&self) -> Result<Vec<RuleRef>, StoreError>;
}

// === impl RuleRef ===

impl RuleRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

// === impl StoreError ===

impl StoreError {
    /// A short description of the failure, e.g. `Forbidden`.
    pub fn reason(&self) -> &str {
        match self {
            Self::Api { reason, .. } => reason,
            Self::Client(msg) => msg,
        }
    }
}

#[async_trait::async_trait]
impl<S: PolicyStore + ?Sized> PolicyStore for std::sync::Arc<S> {
    async fn create_rule(&self, rule: &DirectionalRule) -> Result<CreateOutcome, StoreError> {
        (**self).create_rule(rule).await
    }

    async fn delete_rule(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        (**self).delete_rule(namespace, name).await
    }

    async fn list_rules(&self) -> Result<Vec<RuleRef>, StoreError> {
        (**self).list_rules().await
    }
}
