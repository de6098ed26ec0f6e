//! Built-in local-filesystem collaborators.
//!
//! These implement the capability traits against a single machine: the
//! package store, the running-state store, and the scheduler endpoint are
//! all directories. They are the registry's default entries and let a
//! submission run end-to-end without any external system.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use topsub_config::{Config, TopologyDescriptor, keys};
use topsub_utils::error::{PluginError, StateError};

use crate::adaptor::StateManagerAdaptor;
use crate::context::RuntimeContext;
use crate::packing::{ContainerPlan, InstancePlan, PackingPlan};
use crate::registry::{ROLE_LAUNCHER, ROLE_PACKING, ROLE_UPLOADER};
use crate::{Launcher, PackingStrategy, StateManager, Uploader};

fn require_str<'a>(
    config: &'a Config,
    key: &str,
    role: &'static str,
) -> Result<&'a str, PluginError> {
    config
        .get_str(key)
        .ok_or_else(|| PluginError::InitializationFailed {
            role,
            reason: format!("configuration key {key} is not set"),
        })
}

/// Copies the topology package into a shared directory and hands back a
/// `file://` locator.
#[derive(Debug, Default)]
pub struct LocalFsUploader {
    dest_dir: Option<PathBuf>,
    package: Option<PathBuf>,
    uploaded: Option<PathBuf>,
}

impl Uploader for LocalFsUploader {
    fn initialize(&mut self, config: &Config) -> Result<(), PluginError> {
        let upload_dir = require_str(config, keys::UPLOAD_DIR, ROLE_UPLOADER)?;
        let topology_name = require_str(config, keys::TOPOLOGY_NAME, ROLE_UPLOADER)?;
        let package = require_str(config, keys::TOPOLOGY_PACKAGE_FILE, ROLE_UPLOADER)?;

        self.dest_dir = Some(PathBuf::from(upload_dir).join(topology_name));
        self.package = Some(PathBuf::from(package));
        Ok(())
    }

    fn upload_package(&mut self) -> Result<Option<Url>, PluginError> {
        let (Some(dest_dir), Some(package)) = (self.dest_dir.as_ref(), self.package.as_ref())
        else {
            return Err(PluginError::OperationFailed {
                role: ROLE_UPLOADER,
                reason: "uploader was not initialized".to_string(),
            });
        };

        let Some(file_name) = package.file_name() else {
            return Err(PluginError::OperationFailed {
                role: ROLE_UPLOADER,
                reason: format!("package path {} has no file name", package.display()),
            });
        };

        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(file_name);
        std::fs::copy(package, &dest)?;
        self.uploaded = Some(dest.clone());

        let absolute = dest.canonicalize().unwrap_or(dest);
        let url = Url::from_file_path(&absolute).map_err(|()| PluginError::OperationFailed {
            role: ROLE_UPLOADER,
            reason: format!("{} is not an absolute path", absolute.display()),
        })?;
        debug!(location = %url, "package uploaded");
        Ok(Some(url))
    }

    fn undo(&mut self) -> Result<(), PluginError> {
        if let Some(uploaded) = self.uploaded.take() {
            match std::fs::remove_file(&uploaded) {
                Ok(()) => debug!(path = %uploaded.display(), "removed uploaded package"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(PluginError::Io(e)),
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.dest_dir = None;
        self.package = None;
    }
}

/// Tracks running topologies as `<name>.running` marker files.
#[derive(Debug, Default)]
pub struct LocalFsStateManager {
    root: Option<PathBuf>,
}

impl LocalFsStateManager {
    fn marker(&self, name: &str) -> Result<PathBuf, StateError> {
        self.root
            .as_ref()
            .map(|root| root.join(format!("{name}.running")))
            .ok_or_else(|| StateError::Unavailable("state manager was not initialized".to_string()))
    }
}

#[async_trait]
impl StateManager for LocalFsStateManager {
    fn initialize(&mut self, config: &Config) -> Result<(), StateError> {
        let root = config.get_str(keys::STATE_DIR).ok_or_else(|| {
            StateError::Unavailable(format!("configuration key {} is not set", keys::STATE_DIR))
        })?;
        let root = PathBuf::from(root);
        std::fs::create_dir_all(&root)?;
        self.root = Some(root);
        Ok(())
    }

    async fn is_topology_running(&self, name: &str) -> Result<bool, StateError> {
        let marker = self.marker(name)?;
        Ok(tokio::fs::try_exists(&marker).await?)
    }

    async fn register_running(&self, name: &str) -> Result<(), StateError> {
        let marker = self.marker(name)?;
        tokio::fs::write(&marker, name.as_bytes()).await?;
        Ok(())
    }

    async fn clear_running(&self, name: &str) -> Result<(), StateError> {
        let marker = self.marker(name)?;
        match tokio::fs::remove_file(&marker).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::Io(e)),
        }
    }

    fn close(&self) {
        debug!("closing local state manager");
    }
}

/// What the local launcher hands to the scheduler: everything needed to
/// bring the topology up.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LaunchRecord {
    pub topology_id: String,
    pub topology_name: String,
    pub package_location: Url,
    pub plan: PackingPlan,
}

/// Registers the launch by writing a launch record into the scheduler
/// directory and marking the topology running in the state store.
#[derive(Default)]
pub struct LocalLauncher {
    scheduler_dir: Option<PathBuf>,
    record_path: Option<PathBuf>,
    registered: Option<(StateManagerAdaptor, String)>,
}

#[async_trait]
impl Launcher for LocalLauncher {
    fn initialize(&mut self, config: &Config) -> Result<(), PluginError> {
        let dir = require_str(config, keys::SCHEDULER_DIR, ROLE_LAUNCHER)?;
        self.scheduler_dir = Some(PathBuf::from(dir));
        Ok(())
    }

    async fn launch(&mut self, ctx: &RuntimeContext) -> Result<bool, PluginError> {
        let Some(scheduler_dir) = self.scheduler_dir.as_ref() else {
            return Err(PluginError::OperationFailed {
                role: ROLE_LAUNCHER,
                reason: "launcher was not initialized".to_string(),
            });
        };

        let plan = ctx.packing.pack(&ctx.topology);
        let record = LaunchRecord {
            topology_id: ctx.topology_id.clone(),
            topology_name: ctx.topology_name.clone(),
            package_location: ctx.package_location.clone(),
            plan,
        };

        std::fs::create_dir_all(scheduler_dir)?;
        let record_path = scheduler_dir.join(format!("{}.json", ctx.topology_name));
        let contents =
            serde_json::to_vec_pretty(&record).map_err(|e| PluginError::OperationFailed {
                role: ROLE_LAUNCHER,
                reason: format!("could not encode launch record: {e}"),
            })?;
        std::fs::write(&record_path, contents)?;
        self.record_path = Some(record_path);

        ctx.statemgr
            .register_running(&ctx.topology_name)
            .await
            .map_err(|e| PluginError::OperationFailed {
                role: ROLE_LAUNCHER,
                reason: format!("could not register running state: {e}"),
            })?;
        self.registered = Some((ctx.statemgr.clone(), ctx.topology_name.clone()));

        info!(
            topology = %ctx.topology_name,
            containers = record.plan.containers.len(),
            "launch registered with local scheduler"
        );
        Ok(true)
    }

    async fn undo(&mut self) -> Result<(), PluginError> {
        if let Some(record_path) = self.record_path.take() {
            match std::fs::remove_file(&record_path) {
                Ok(()) => debug!(path = %record_path.display(), "removed launch record"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(PluginError::Io(e)),
            }
        }
        if let Some((statemgr, name)) = self.registered.take() {
            statemgr
                .clear_running(&name)
                .await
                .map_err(|e| PluginError::OperationFailed {
                    role: ROLE_LAUNCHER,
                    reason: format!("could not clear running state: {e}"),
                })?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.scheduler_dir = None;
    }
}

/// Distributes component instances over a fixed number of containers in
/// round-robin task-id order.
#[derive(Debug, Default)]
pub struct RoundRobinPacking {
    containers: u32,
}

impl PackingStrategy for RoundRobinPacking {
    fn initialize(&mut self, config: &Config) -> Result<(), PluginError> {
        let containers = config.get_int(keys::PACKING_CONTAINERS).unwrap_or(1);
        if containers < 1 {
            return Err(PluginError::InitializationFailed {
                role: ROLE_PACKING,
                reason: format!("{} must be at least 1, got {containers}", keys::PACKING_CONTAINERS),
            });
        }
        self.containers = u32::try_from(containers).map_err(|_| {
            PluginError::InitializationFailed {
                role: ROLE_PACKING,
                reason: format!("{} is out of range: {containers}", keys::PACKING_CONTAINERS),
            }
        })?;
        Ok(())
    }

    fn pack(&self, topology: &TopologyDescriptor) -> PackingPlan {
        let containers = self.containers.max(1);
        let mut plans: Vec<ContainerPlan> = (0..containers)
            .map(|id| ContainerPlan {
                id,
                instances: Vec::new(),
            })
            .collect();

        let mut task_id = 0_u32;
        for component in &topology.components {
            for _ in 0..component.parallelism {
                let slot = (task_id % containers) as usize;
                plans[slot].instances.push(InstancePlan {
                    component: component.name.clone(),
                    task_id,
                    cpu: component.resources.cpu,
                    ram_mb: component.resources.ram_mb,
                });
                task_id += 1;
            }
        }

        PackingPlan { containers: plans }
    }
}
