//! Engine and provider error types

use crate::action::ActionResult;
use fleetform_core::FleetformError;
use thiserror::Error;

/// A single input validation failure reported by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub property: String,
    pub reason: String,
}

impl std::fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.property, self.reason)
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Unsupported resource type: {0}")]
    UnsupportedType(String),

    #[error("Invalid inputs for {urn}: {}", format_failures(.failures))]
    CheckFailed {
        urn: String,
        failures: Vec<CheckFailure>,
    },

    #[error("Update of {stack} failed: {}", format_results(.failed))]
    UpdateFailed {
        stack: String,
        failed: Vec<ActionResult>,
    },

    #[error("Operation not supported by provider: {0}")]
    Unsupported(String),

    #[error("Resource is protected: {0}")]
    ProtectedResource(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error(transparent)]
    Declaration(#[from] FleetformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_failures(failures: &[CheckFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_results(results: &[ActionResult]) -> String {
    results
        .iter()
        .map(|r| match &r.error {
            Some(error) => format!("{} {}: {}", r.op, r.urn, error),
            None => format!("{} {}", r.op, r.urn),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<CloudError> for FleetformError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Declaration(inner) => inner,
            other => FleetformError::Runtime(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
