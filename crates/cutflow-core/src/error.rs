//! Error types for cutflow

use thiserror::Error;

/// Main error type for cutflow operations.
///
/// Configuration errors abort setup, consistency errors abort the job.
/// `Unset` is the only variant callers are expected to recover from.
#[derive(Debug, Error)]
pub enum CutflowError {
    /// Invalid job or selection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A name was registered twice in the same scope
    #[error("Duplicate {kind} '{name}' in scope '{scope}'")]
    DuplicateName {
        kind: &'static str,
        name: String,
        scope: String,
    },

    /// Registration attempted after the registry was locked
    #[error("Registry is locked, cannot register '{name}'")]
    Locked { name: String },

    /// A cut was used before it was bound to a value
    #[error("Cut '{0}' has not been initialized")]
    NotInitialized(String),

    /// Malformed cut expression
    #[error("Parse error: {0}")]
    Parse(String),

    /// A variation that the catalog does not know about
    #[error("Unknown variation '{0}'")]
    UnknownVariation(String),

    /// A variable or container that was never registered
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// Value kind does not match the declared kind
    #[error("Type mismatch for '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// Variation output disagrees with its nominal counterpart
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Value read before it was written in the current event
    #[error("'{name}' has not been set for variation '{variation}' in this event")]
    Unset { name: String, variation: String },

    /// An external tool adapter refused a request
    #[error("Tool service '{service}' failed: {message}")]
    ToolService { service: String, message: String },
}

/// Result type alias for cutflow operations
pub type Result<T> = std::result::Result<T, CutflowError>;
