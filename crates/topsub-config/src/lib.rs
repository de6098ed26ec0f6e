//! Configuration assembly for the submission client.
//!
//! The assembler produces one immutable, fully-expanded [`Config`] from four
//! layers merged in fixed precedence order:
//!
//! ```text
//! built-in defaults < cluster file < command line < topology-derived
//! ```
//!
//! followed by a bounded `${key}` placeholder expansion pass over the merged
//! map. See [`config`] for the map and layering, [`keys`] for the well-known
//! key names, and [`topology`] for the job definition.

pub mod config;
pub mod keys;
pub mod topology;

pub use config::{
    Config, ConfigBuilder, ConfigValue, SubmissionArgs, assemble, cluster_file_layer,
    command_line_layer, defaults_layer, parse_override, topology_layer,
};
pub use topology::{ComponentSpec, PackageKind, ResourceSpec, TopologyDescriptor};
