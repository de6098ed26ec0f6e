//! Collaborator contracts for the submission workflow.
//!
//! The orchestrator drives four pluggable collaborators, each specified only
//! at its interface boundary: the distributed state manager, the package
//! uploader, the cluster launcher, and the packing strategy. Concrete
//! implementations are selected entirely through configuration via the
//! [`registry::PluginRegistry`]; the orchestrator never names a concrete
//! type.
//!
//! `undo` and `close` must be safe no-ops when the corresponding resource
//! was never created: the rollback path invokes both undos unconditionally,
//! and cleanup closes every collaborator on every exit path.

use async_trait::async_trait;
use url::Url;

use topsub_config::{Config, TopologyDescriptor};
use topsub_utils::error::{PluginError, StateError};

pub mod adaptor;
pub mod context;
pub mod local;
pub mod packing;
pub mod registry;

pub use adaptor::{RunningState, StateManagerAdaptor};
pub use context::RuntimeContext;
pub use packing::{ContainerPlan, InstancePlan, PackingPlan};
pub use registry::PluginRegistry;

/// Distributed store tracking which topologies are currently running.
///
/// The running check is inherently asynchronous; everything else the
/// submission flow needs is a registration pair used by launchers and a
/// close that releases any held connection.
#[async_trait]
pub trait StateManager: Send + Sync {
    /// Bind to the store described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or its location is
    /// not configured.
    fn initialize(&mut self, config: &Config) -> Result<(), StateError>;

    /// Whether a topology with this name is currently registered as running.
    async fn is_topology_running(&self, name: &str) -> Result<bool, StateError>;

    /// Register a topology as running. Invoked by launchers, not by the
    /// orchestrator directly.
    async fn register_running(&self, name: &str) -> Result<(), StateError>;

    /// Remove a running registration. Safe when no registration exists.
    async fn clear_running(&self, name: &str) -> Result<(), StateError>;

    /// Release held resources. Safe when never initialized.
    fn close(&self);
}

/// Transfers the topology package into shared storage.
pub trait Uploader: Send + Sync + std::fmt::Debug {
    /// # Errors
    ///
    /// Returns an error if the upload destination is not configured.
    fn initialize(&mut self, config: &Config) -> Result<(), PluginError>;

    /// Upload the package and return its location. `Ok(None)` signals a
    /// failed upload without a transport error.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; the orchestrator treats this
    /// the same as `Ok(None)`.
    fn upload_package(&mut self) -> Result<Option<Url>, PluginError>;

    /// Retract a partially-visible upload. Safe no-op when nothing was
    /// uploaded.
    ///
    /// # Errors
    ///
    /// Undo failures are logged by the orchestrator, never escalated.
    fn undo(&mut self) -> Result<(), PluginError>;

    /// Release held resources. Safe when never initialized.
    fn close(&mut self);
}

/// Registers the topology's launch with the cluster scheduler.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the scheduler endpoint is not configured.
    fn initialize(&mut self, config: &Config) -> Result<(), PluginError>;

    /// Launch the topology described by the runtime context. Returns `false`
    /// to report a failed launch without a transport error.
    ///
    /// # Errors
    ///
    /// Returns an error on scheduler failure; the orchestrator treats this
    /// the same as `Ok(false)`.
    async fn launch(&mut self, ctx: &RuntimeContext) -> Result<bool, PluginError>;

    /// Retract a partially-registered launch. Safe no-op when nothing was
    /// registered.
    ///
    /// # Errors
    ///
    /// Undo failures are logged by the orchestrator, never escalated.
    async fn undo(&mut self) -> Result<(), PluginError>;

    /// Release held resources. Safe when never initialized.
    fn close(&mut self);
}

/// Decides resource placement for the topology. The plan is consumed by the
/// launcher; the orchestrator treats it as opaque.
pub trait PackingStrategy: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the strategy's parameters are invalid.
    fn initialize(&mut self, config: &Config) -> Result<(), PluginError>;

    /// Produce a packing plan for the topology.
    fn pack(&self, topology: &TopologyDescriptor) -> PackingPlan;
}
