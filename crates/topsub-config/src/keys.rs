//! Well-known configuration key names.
//!
//! Keys are dotted, lower-case, and namespaced under `topsub.`. Cluster
//! files use nested TOML tables that flatten to the same dotted form.

/// Name of the cluster the topology runs on.
pub const CLUSTER: &str = "topsub.cluster";

/// Role the topology runs under.
pub const ROLE: &str = "topsub.role";

/// Environment tag (e.g. devel, staging, prod).
pub const ENVIRON: &str = "topsub.environ";

/// Directory where topsub is installed.
pub const HOME: &str = "topsub.home";

/// Directory containing cluster configuration files.
pub const CONFIG_PATH: &str = "topsub.config.path";

/// Type identifier of the state manager implementation.
pub const STATEMGR_CLASS: &str = "topsub.class.statemgr";

/// Type identifier of the launcher implementation.
pub const LAUNCHER_CLASS: &str = "topsub.class.launcher";

/// Type identifier of the packing strategy implementation.
pub const PACKING_CLASS: &str = "topsub.class.packing";

/// Type identifier of the uploader implementation.
pub const UPLOADER_CLASS: &str = "topsub.class.uploader";

/// Topology identifier from the definition file.
pub const TOPOLOGY_ID: &str = "topsub.topology.id";

/// Human-readable topology name from the definition file.
pub const TOPOLOGY_NAME: &str = "topsub.topology.name";

/// Path of the serialized topology definition file.
pub const TOPOLOGY_DEFN_FILE: &str = "topsub.topology.defn.file";

/// Path of the package containing the user artifact, defn and config.
pub const TOPOLOGY_PACKAGE_FILE: &str = "topsub.topology.package.file";

/// Path of the user-submitted topology artifact.
pub const TOPOLOGY_ARTIFACT_FILE: &str = "topsub.topology.artifact.file";

/// Archive kind of the topology package (`jar` or `tar`).
pub const TOPOLOGY_PACKAGE_TYPE: &str = "topsub.topology.package.type";

/// Root directory for the local-filesystem state manager.
pub const STATE_DIR: &str = "topsub.dirs.state";

/// Destination directory for the local-filesystem uploader.
pub const UPLOAD_DIR: &str = "topsub.dirs.uploads";

/// Directory where the local launcher writes launch records.
pub const SCHEDULER_DIR: &str = "topsub.dirs.scheduler";

/// Bounded wait for the running-topology check, in seconds.
pub const STATEMGR_CHECK_TIMEOUT_SECS: &str = "topsub.statemgr.check.timeout.secs";

/// Number of containers the round-robin packing strategy distributes over.
pub const PACKING_CONTAINERS: &str = "topsub.packing.containers";

/// The keys the orchestrator reads and therefore requires after merge.
pub const REQUIRED_FOR_SUBMISSION: &[&str] = &[
    CLUSTER,
    ROLE,
    ENVIRON,
    HOME,
    STATEMGR_CLASS,
    LAUNCHER_CLASS,
    PACKING_CLASS,
    UPLOADER_CLASS,
    TOPOLOGY_ID,
    TOPOLOGY_NAME,
    TOPOLOGY_PACKAGE_FILE,
    TOPOLOGY_ARTIFACT_FILE,
];
