//! topsub - topology submission client for distributed stream-processing
//! clusters.
//!
//! topsub assembles a unified configuration from defaults, cluster files,
//! and command-line overrides, resolves the four pluggable collaborators
//! (state manager, uploader, launcher, packing strategy) from
//! configuration-supplied type identifiers, and drives one bounded,
//! failure-aware submission attempt: validate, upload, launch, then commit
//! or roll back.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! topsub \
//!   --cluster devel --role ads --environment staging \
//!   --home /opt/topsub --config-path /opt/topsub/conf \
//!   --topology-package ./word-count.tar.gz \
//!   --topology-defn ./word-count.json \
//!   --topology-artifact ./word-count.jar
//! ```
//!
//! Exit code 0 means the submission committed; 1 means any failure,
//! including a validation rejection when the topology is already running.
//!
//! # Quick Start (Library)
//!
//! The submission flow is a library call: assemble a [`Config`], resolve
//! collaborators through a [`PluginRegistry`], and await
//! [`Submitter::submit`]. The CLI in [`cli`] is a thin wrapper over exactly
//! that sequence.

// ============================================================================
// Public API
// ============================================================================

/// Immutable, ordered configuration map produced by layered merge and
/// placeholder expansion.
pub use topsub_config::Config;

/// Append-only builder for [`Config`]; layer precedence is expressed by
/// merge order.
pub use topsub_config::ConfigBuilder;

/// Inputs the configuration assembler needs from the command line.
pub use topsub_config::SubmissionArgs;

/// The deserialized job definition, loaded once per attempt.
pub use topsub_config::{ComponentSpec, ResourceSpec, TopologyDescriptor};

/// Assemble the unified configuration for one submission attempt.
pub use topsub_config::assemble;

/// Well-known configuration key names.
pub use topsub_config::keys;

/// Registry resolving configured type identifiers to collaborator
/// instances.
pub use topsub_spi::PluginRegistry;

/// Three-valued result of the bounded running check.
pub use topsub_spi::RunningState;

/// Per-attempt values handed to the launcher.
pub use topsub_spi::RuntimeContext;

/// Bounded-wait façade over the distributed state manager.
pub use topsub_spi::StateManagerAdaptor;

/// Collaborator capability contracts.
pub use topsub_spi::{Launcher, PackingStrategy, StateManager, Uploader};

/// The submission state machine and its outcome.
pub use topsub_engine::{Stage, SubmissionOutcome, Submitter};

/// Error taxonomy: fatal configuration/plugin errors and stage-tagged
/// submission failures.
pub use topsub_utils::error::{ConfigError, PluginError, StateError, SubmitError, TopsubError};

/// Type-safe exit codes for the CLI surface.
pub use topsub_utils::exit_codes::ExitCode;

/// Logging initialization, installed once per process by the CLI.
pub use topsub_utils::logging;

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub use topsub_config::parse_override;

#[doc(hidden)]
pub use topsub_spi::local;

#[doc(hidden)]
pub use topsub_spi::packing;

// CLI module - internal implementation detail, exported for white-box tests
// of flag parsing; external consumers should use the library API above.
#[doc(hidden)]
pub mod cli;
