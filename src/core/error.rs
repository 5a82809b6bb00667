use thiserror::Error;
use uuid::Uuid;

use super::types::RuleType;

/// Errors raised by a rule store, either while serving the engine or while
/// handling administrative operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing store could not be reached. Safe to retry.
    #[error("rule store unavailable: {0}")]
    Unavailable(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The submitted rule or child record was rejected.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl StoreError {
    pub fn rule_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "tax rule",
            id: id.to_string(),
        }
    }

    /// Whether the failure is an infrastructure problem rather than a
    /// business outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors raised while assembling or validating a rule definition.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleError {
    /// A child record was attached to a rule of another type.
    #[error("rule {rule_id} has type {actual}, expected {expected}")]
    TypeMismatch {
        rule_id: Uuid,
        expected: RuleType,
        actual: RuleType,
    },

    /// The rule failed validation.
    #[error("invalid rule: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

/// Errors surfaced by the calculation engine.
///
/// Business outcomes (no rules, no matching bracket, missing region) are
/// never errors; only infrastructure and configuration failures are.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Reading rules or organization data failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Engine configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Config(_) => false,
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "brackets[1].rate").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
