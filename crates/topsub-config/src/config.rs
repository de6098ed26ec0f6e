//! The configuration map and layered assembly.
//!
//! [`Config`] is an immutable, ordered key-to-value mapping produced by
//! merging four layers in fixed precedence order (defaults < cluster file <
//! command line < topology-derived) and then expanding `${key}` placeholders
//! against the merged map itself until a fixed point is reached.
//!
//! The merge is append-only: each layer may only add keys or override keys
//! already present, and a key collision resolves to the later layer.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use topsub_utils::error::ConfigError;

use crate::keys;
use crate::topology::{PackageKind, TopologyDescriptor};

/// Upper bound on placeholder expansion passes. Guards against placeholder
/// cycles such as `a = "${b}"`, `b = "${a}"`.
const MAX_EXPANSION_PASSES: usize = 10;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl ConfigValue {
    /// String form used for placeholder substitution and display.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&Path> for ConfigValue {
    fn from(value: &Path) -> Self {
        Self::Str(value.display().to_string())
    }
}

/// Append-only builder for [`Config`].
///
/// Later `put`/`put_all` calls override earlier ones on key collision, which
/// is exactly how layer precedence is expressed: merge layers lowest
/// precedence first.
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override a single key.
    #[must_use]
    pub fn put(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Merge every entry of `layer` into this builder, overriding on
    /// collision.
    #[must_use]
    pub fn put_all(mut self, layer: Config) -> Self {
        self.entries.extend(layer.entries);
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        Config {
            entries: self.entries,
        }
    }
}

/// Immutable, ordered configuration map.
///
/// Produced only through [`ConfigBuilder`]; exposes no mutation after build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    entries: BTreeMap<String, ConfigValue>,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(ConfigValue::as_str)
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.entries.get(key).and_then(ConfigValue::as_int)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(ConfigValue::as_bool)
    }

    /// Get a string value, failing with `ConfigError::MissingRequired` if
    /// the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or not a string.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.get_str(key)
            .ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `${key}` placeholders in string values against the map itself,
    /// iterating until no placeholder remains.
    ///
    /// Expansion is idempotent: expanding an already-expanded configuration
    /// returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnresolvedPlaceholder` if a placeholder names a
    /// key that is not in the map, and `ConfigError::ExpansionDidNotConverge`
    /// if placeholders survive `MAX_EXPANSION_PASSES` passes (a cycle).
    pub fn expand(self) -> Result<Self, ConfigError> {
        let mut entries = self.entries;

        for _pass in 0..MAX_EXPANSION_PASSES {
            if !entries.values().any(has_placeholder) {
                return Ok(Self { entries });
            }

            // Substitutions read from a snapshot so that the order keys are
            // visited within a pass cannot change the result.
            let snapshot = entries.clone();
            for (key, value) in &mut entries {
                let ConfigValue::Str(s) = value else { continue };
                let substituted = substitute_once(key, s, &snapshot)?;
                *value = ConfigValue::Str(substituted);
            }
        }

        if entries.values().any(has_placeholder) {
            return Err(ConfigError::ExpansionDidNotConverge {
                passes: MAX_EXPANSION_PASSES,
            });
        }
        Ok(Self { entries })
    }

    /// Verify that every key the orchestrator reads is present after merge.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` listing every missing key.
    pub fn validate_for_submission(&self) -> Result<(), ConfigError> {
        let missing: Vec<String> = keys::REQUIRED_FOR_SUBMISSION
            .iter()
            .filter(|key| !self.contains_key(key))
            .map(|key| (*key).to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { missing })
        }
    }
}

fn has_placeholder(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Str(s) => match s.find("${") {
            Some(pos) => s[pos..].contains('}'),
            None => false,
        },
        _ => false,
    }
}

/// One left-to-right substitution sweep over a single value. References are
/// resolved from `snapshot`; text pulled in by a substitution is picked up
/// on the next pass.
fn substitute_once(
    key: &str,
    value: &str,
    snapshot: &BTreeMap<String, ConfigValue>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        let Some(close_rel) = rest[open..].find('}') else {
            // Unterminated placeholder opener; treat the remainder as literal.
            out.push_str(rest);
            return Ok(out);
        };
        let close = open + close_rel;

        out.push_str(&rest[..open]);
        let reference = &rest[open + 2..close];
        match snapshot.get(reference) {
            Some(resolved) => out.push_str(&resolved.render()),
            None => {
                return Err(ConfigError::UnresolvedPlaceholder {
                    key: key.to_string(),
                    reference: reference.to_string(),
                });
            }
        }
        rest = &rest[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Inputs the assembler needs from the command line.
#[derive(Debug, Clone)]
pub struct SubmissionArgs {
    pub cluster: String,
    pub role: String,
    pub environ: String,
    pub home: PathBuf,
    pub config_path: PathBuf,
    pub topology_package: PathBuf,
    pub topology_defn: PathBuf,
    pub topology_artifact: PathBuf,
    pub config_overrides: Vec<(String, String)>,
}

/// Parse one `key=value` command-line override.
///
/// # Errors
///
/// Returns `ConfigError::InvalidOverride` if the pair has no `=` or an
/// empty key.
pub fn parse_override(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidOverride(raw.to_string())),
    }
}

/// Built-in defaults: local collaborator implementations and directory
/// layout rooted under the installation directory.
#[must_use]
pub fn defaults_layer(home: &Path, config_path: &Path) -> Config {
    Config::builder()
        .put(keys::HOME, home)
        .put(keys::CONFIG_PATH, config_path)
        .put(keys::STATEMGR_CLASS, "localfs")
        .put(keys::LAUNCHER_CLASS, "local")
        .put(keys::PACKING_CLASS, "roundrobin")
        .put(keys::UPLOADER_CLASS, "localfs")
        .put(keys::STATE_DIR, "${topsub.home}/state")
        .put(keys::UPLOAD_DIR, "${topsub.home}/uploads")
        .put(keys::SCHEDULER_DIR, "${topsub.home}/scheduler")
        .put(keys::STATEMGR_CHECK_TIMEOUT_SECS, 5_i64)
        .put(keys::PACKING_CONTAINERS, 2_i64)
        .build()
}

/// Load `<config_path>/<cluster>.toml` and flatten its nested tables into
/// dotted keys.
///
/// # Errors
///
/// Returns `ConfigError::ClusterFileNotFound` if the file does not exist and
/// `ConfigError::InvalidFile` if it cannot be parsed or contains value types
/// the configuration map does not model.
pub fn cluster_file_layer(config_path: &Path, cluster: &str) -> Result<Config, ConfigError> {
    let path = config_path.join(format!("{cluster}.toml"));
    if !path.is_file() {
        return Err(ConfigError::ClusterFileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::InvalidFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let table: toml::Table =
        toml::from_str(&contents).map_err(|e| ConfigError::InvalidFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let mut entries = BTreeMap::new();
    flatten_table("", &table, &mut entries, &path)?;
    Ok(Config { entries })
}

fn flatten_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, ConfigValue>,
    path: &Path,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            toml::Value::String(s) => {
                out.insert(key, ConfigValue::Str(s.clone()));
            }
            toml::Value::Integer(i) => {
                out.insert(key, ConfigValue::Int(*i));
            }
            toml::Value::Boolean(b) => {
                out.insert(key, ConfigValue::Bool(*b));
            }
            toml::Value::Table(nested) => {
                flatten_table(&key, nested, out, path)?;
            }
            _ => {
                return Err(ConfigError::InvalidFile {
                    path: path.display().to_string(),
                    reason: format!(
                        "key {key} has a value type the configuration map does not model \
                         (only strings, integers, booleans, and tables are accepted)"
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Command-line layer: cluster/role/environment tags plus explicit
/// `key=value` overrides, applied last within the layer.
#[must_use]
pub fn command_line_layer(
    cluster: &str,
    role: &str,
    environ: &str,
    overrides: &[(String, String)],
) -> Config {
    let mut builder = Config::builder()
        .put(keys::CLUSTER, cluster)
        .put(keys::ROLE, role)
        .put(keys::ENVIRON, environ);
    for (key, value) in overrides {
        builder = builder.put(key.clone(), value.clone());
    }
    builder.build()
}

/// Topology-derived layer: identity and artifact locations of the job being
/// submitted, including the archive kind derived from the artifact name.
#[must_use]
pub fn topology_layer(topology: &TopologyDescriptor, args: &SubmissionArgs) -> Config {
    let package_type = PackageKind::from_artifact(&args.topology_artifact);
    Config::builder()
        .put(keys::TOPOLOGY_ID, topology.id.as_str())
        .put(keys::TOPOLOGY_NAME, topology.name.as_str())
        .put(keys::TOPOLOGY_DEFN_FILE, args.topology_defn.as_path())
        .put(keys::TOPOLOGY_PACKAGE_FILE, args.topology_package.as_path())
        .put(
            keys::TOPOLOGY_ARTIFACT_FILE,
            args.topology_artifact.as_path(),
        )
        .put(keys::TOPOLOGY_PACKAGE_TYPE, package_type.as_str())
        .build()
}

/// Assemble the unified configuration for one submission attempt.
///
/// Merges defaults, the cluster file, command-line values, and
/// topology-derived values in that precedence order, expands placeholders,
/// and validates that every key the orchestrator reads is present.
///
/// # Errors
///
/// Returns the first configuration error encountered: an unreadable or
/// malformed cluster file, a failed expansion, or missing required keys.
pub fn assemble(
    args: &SubmissionArgs,
    topology: &TopologyDescriptor,
) -> Result<Config, ConfigError> {
    let merged = Config::builder()
        .put_all(defaults_layer(&args.home, &args.config_path))
        .put_all(cluster_file_layer(&args.config_path, &args.cluster)?)
        .put_all(command_line_layer(
            &args.cluster,
            &args.role,
            &args.environ,
            &args.config_overrides,
        ))
        .put_all(topology_layer(topology, args))
        .build();

    let expanded = merged.expand()?;
    expanded.validate_for_submission()?;
    Ok(expanded)
}
