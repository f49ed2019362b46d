//! Error types for group model operations
//!
//! Resolution itself cannot fail. Every error here is raised at the
//! boundary where group definitions enter the model, so that malformed
//! configuration never reaches the resolver.

use thiserror::Error;

/// Group model error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermsError {
    /// A group name was referenced but never defined
    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    /// Two definitions share the same group name
    #[error("Duplicate group: {0}")]
    DuplicateGroup(String),

    /// Adding the parent edge would make the group inherit from itself
    #[error("Inheritance cycle: {group} cannot inherit from {parent}")]
    InheritanceCycle {
        /// Group receiving the new parent.
        group: String,
        /// Parent that already (transitively) inherits from `group`.
        parent: String,
    },

    /// The configured default group is not among the definitions
    #[error("Default group is not defined: {0}")]
    DefaultGroupMissing(String),

    /// Configuration could not be parsed or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for group model operations.
pub type PermsResult<T> = Result<T, PermsError>;

impl PermsError {
    /// Get a stable error code for logs and admin tooling.
    pub fn error_code(&self) -> &'static str {
        match self {
            PermsError::UnknownGroup(_) => "UNKNOWN_GROUP",
            PermsError::DuplicateGroup(_) => "DUPLICATE_GROUP",
            PermsError::InheritanceCycle { .. } => "INHERITANCE_CYCLE",
            PermsError::DefaultGroupMissing(_) => "DEFAULT_GROUP_MISSING",
            PermsError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<serde_json::Error> for PermsError {
    fn from(err: serde_json::Error) -> Self {
        PermsError::Config(err.to_string())
    }
}
