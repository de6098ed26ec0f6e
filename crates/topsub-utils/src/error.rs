//! Error taxonomy for the submission client.
//!
//! `TopsubError` is the top-level error type returned by library operations.
//! It aggregates per-concern errors and keeps two classes of failure
//! distinct:
//!
//! - **Fatal** errors (`Config`, `Plugin`) abort before any external side
//!   effect exists; nothing is rolled back because nothing was created.
//! - **Stage** errors (`Submit`) occur inside a submission attempt; the
//!   compensable ones (`UploadFailed`, `LaunchFailed`) trigger the rollback
//!   path, while `ValidationRejected` and state-manager initialization
//!   failures only require closing already-opened resources.
//!
//! Library code returns these types and does NOT call `std::process::exit()`;
//! the CLI maps them to exit codes.

use thiserror::Error;

/// Top-level error type for topsub library operations.
#[derive(Error, Debug)]
pub enum TopsubError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin resolution error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
///
/// All of these are fatal: they abort the process before any collaborator
/// is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("Cluster configuration not found at {path}")]
    ClusterFileNotFound { path: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration override '{0}': expected key=value")]
    InvalidOverride(String),

    #[error("Unresolved placeholder '${{{reference}}}' in configuration key {key}")]
    UnresolvedPlaceholder { key: String, reference: String },

    #[error("Configuration expansion did not converge after {passes} passes (placeholder cycle?)")]
    ExpansionDidNotConverge { passes: usize },

    #[error("Invalid topology definition {path}: {reason}")]
    InvalidDescriptor { path: String, reason: String },

    #[error("Configuration validation failed: missing {}", .missing.join(", "))]
    ValidationFailed { missing: Vec<String> },
}

/// Errors from resolving or operating a pluggable collaborator.
#[derive(Error, Debug)]
pub enum PluginError {
    /// The configured type identifier does not name a registered
    /// implementation. Not retried: configuration errors are not transient.
    #[error("No {role} implementation registered for type '{identifier}' (registered: {registered})")]
    UnknownType {
        role: &'static str,
        identifier: String,
        registered: String,
    },

    #[error("{role} initialization failed: {reason}")]
    InitializationFailed { role: &'static str, reason: String },

    #[error("{role} operation failed: {reason}")]
    OperationFailed { role: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the distributed state store.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("state store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of one submission attempt, tagged with the stage that failed.
///
/// `UploadFailed` and `LaunchFailed` are compensable: a partially-visible
/// upload or partially-registered launch must be retracted, so the
/// orchestrator enters rollback. The other variants occur before any
/// external side effect exists and skip rollback entirely.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("state manager initialization failed for topology {topology}: {reason}")]
    StateManagerInit { topology: String, reason: String },

    #[error("topology {topology} rejected at validation: {reason}")]
    ValidationRejected { topology: String, reason: String },

    #[error("package upload failed for topology {topology}: {reason}")]
    UploadFailed { topology: String, reason: String },

    #[error("launch failed for topology {topology}: {reason}")]
    LaunchFailed { topology: String, reason: String },
}

impl SubmitError {
    /// Whether this failure may have left a partial external side effect
    /// that must be retracted via the rollback path.
    #[must_use]
    pub fn is_compensable(&self) -> bool {
        matches!(
            self,
            Self::UploadFailed { .. } | Self::LaunchFailed { .. }
        )
    }

    /// Name of the topology this attempt was submitting.
    #[must_use]
    pub fn topology(&self) -> &str {
        match self {
            Self::StateManagerInit { topology, .. }
            | Self::ValidationRejected { topology, .. }
            | Self::UploadFailed { topology, .. }
            | Self::LaunchFailed { topology, .. } => topology,
        }
    }
}
