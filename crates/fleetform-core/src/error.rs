//! Declaration SDK error types

use thiserror::Error;

/// Errors raised while declaring resources or resolving their outputs
#[derive(Error, Debug)]
pub enum FleetformError {
    #[error("Invalid resource type token: {0}")]
    InvalidResourceType(String),

    #[error("Invalid URN: {0}")]
    InvalidUrn(String),

    #[error("Invalid {kind} name {name:?}: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("Duplicate export: {0}")]
    DuplicateExport(String),

    #[error("Resource arguments for {0} must serialize to an object")]
    InvalidArguments(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Unresolved output {property} of {urn}")]
    UnresolvedOutput { urn: String, property: String },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FleetformError>;
