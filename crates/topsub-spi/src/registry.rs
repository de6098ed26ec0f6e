//! Configuration-driven plugin resolution.
//!
//! Each collaborator role maps a type identifier string (read from the
//! configuration) to a factory function producing one boxed instance of the
//! role's capability trait. Variant selection happens entirely through
//! configuration; an unknown identifier is a fatal resolution error and is
//! never retried.

use std::collections::HashMap;

use topsub_config::{Config, keys};
use topsub_utils::error::PluginError;

use crate::local::{LocalFsStateManager, LocalFsUploader, LocalLauncher, RoundRobinPacking};
use crate::{Launcher, PackingStrategy, StateManager, Uploader};

pub(crate) const ROLE_STATEMGR: &str = "state manager";
pub(crate) const ROLE_UPLOADER: &str = "uploader";
pub(crate) const ROLE_LAUNCHER: &str = "launcher";
pub(crate) const ROLE_PACKING: &str = "packing strategy";

type StateManagerFactory = fn() -> Box<dyn StateManager>;
type UploaderFactory = fn() -> Box<dyn Uploader>;
type LauncherFactory = fn() -> Box<dyn Launcher>;
type PackingFactory = fn() -> Box<dyn PackingStrategy>;

/// Registry of collaborator factories keyed by type identifier.
pub struct PluginRegistry {
    state_managers: HashMap<String, StateManagerFactory>,
    uploaders: HashMap<String, UploaderFactory>,
    launchers: HashMap<String, LauncherFactory>,
    packings: HashMap<String, PackingFactory>,
}

impl PluginRegistry {
    /// An empty registry with no implementations. Useful for tests that
    /// register their own stubs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state_managers: HashMap::new(),
            uploaders: HashMap::new(),
            launchers: HashMap::new(),
            packings: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in local implementations.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_state_manager("localfs", || Box::new(LocalFsStateManager::default()));
        registry.register_uploader("localfs", || Box::new(LocalFsUploader::default()));
        registry.register_launcher("local", || Box::new(LocalLauncher::default()));
        registry.register_packing("roundrobin", || Box::new(RoundRobinPacking::default()));
        registry
    }

    pub fn register_state_manager(&mut self, identifier: &str, factory: StateManagerFactory) {
        self.state_managers.insert(identifier.to_string(), factory);
    }

    pub fn register_uploader(&mut self, identifier: &str, factory: UploaderFactory) {
        self.uploaders.insert(identifier.to_string(), factory);
    }

    pub fn register_launcher(&mut self, identifier: &str, factory: LauncherFactory) {
        self.launchers.insert(identifier.to_string(), factory);
    }

    pub fn register_packing(&mut self, identifier: &str, factory: PackingFactory) {
        self.packings.insert(identifier.to_string(), factory);
    }

    /// Resolve the configured state manager.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::UnknownType` for an unregistered identifier.
    pub fn resolve_state_manager(
        &self,
        config: &Config,
    ) -> Result<Box<dyn StateManager>, PluginError> {
        let identifier = configured_identifier(config, keys::STATEMGR_CLASS, ROLE_STATEMGR)?;
        instantiate(&self.state_managers, ROLE_STATEMGR, identifier)
    }

    /// Resolve the configured uploader.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::UnknownType` for an unregistered identifier.
    pub fn resolve_uploader(&self, config: &Config) -> Result<Box<dyn Uploader>, PluginError> {
        let identifier = configured_identifier(config, keys::UPLOADER_CLASS, ROLE_UPLOADER)?;
        instantiate(&self.uploaders, ROLE_UPLOADER, identifier)
    }

    /// Resolve the configured launcher.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::UnknownType` for an unregistered identifier.
    pub fn resolve_launcher(&self, config: &Config) -> Result<Box<dyn Launcher>, PluginError> {
        let identifier = configured_identifier(config, keys::LAUNCHER_CLASS, ROLE_LAUNCHER)?;
        instantiate(&self.launchers, ROLE_LAUNCHER, identifier)
    }

    /// Resolve the configured packing strategy.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::UnknownType` for an unregistered identifier.
    pub fn resolve_packing(
        &self,
        config: &Config,
    ) -> Result<Box<dyn PackingStrategy>, PluginError> {
        let identifier = configured_identifier(config, keys::PACKING_CLASS, ROLE_PACKING)?;
        instantiate(&self.packings, ROLE_PACKING, identifier)
    }
}

fn configured_identifier<'a>(
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

fn instantiate<T: ?Sized>(
    factories: &HashMap<String, fn() -> Box<T>>,
    role: &'static str,
    identifier: &str,
) -> Result<Box<T>, PluginError> {
    match factories.get(identifier) {
        Some(factory) => Ok(factory()),
        None => {
            let mut registered: Vec<&str> = factories.keys().map(String::as_str).collect();
            registered.sort_unstable();
            Err(PluginError::UnknownType {
                role,
                identifier: identifier.to_string(),
                registered: registered.join(", "),
            })
        }
    }
}
