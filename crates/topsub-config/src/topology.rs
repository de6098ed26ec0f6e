//! The topology descriptor: the deserialized job definition.
//!
//! The definition file is JSON produced by the client-side packaging step.
//! The descriptor is loaded once per submission attempt and read-only
//! thereafter.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use topsub_utils::error::ConfigError;

/// Resource ask for a single component instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceSpec {
    /// CPU cores per instance.
    #[serde(default = "default_cpu")]
    pub cpu: f64,
    /// RAM per instance, in megabytes.
    #[serde(default = "default_ram_mb")]
    pub ram_mb: u64,
}

fn default_cpu() -> f64 {
    1.0
}

fn default_ram_mb() -> u64 {
    1024
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            ram_mb: default_ram_mb(),
        }
    }
}

/// One processing component of the topology.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComponentSpec {
    pub name: String,
    /// Number of parallel instances to run.
    pub parallelism: u32,
    #[serde(default)]
    pub resources: ResourceSpec,
}

/// The deserialized job definition: identity plus structural and resource
/// specification. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopologyDescriptor {
    pub id: String,
    pub name: String,
    pub components: Vec<ComponentSpec>,
    /// Free-form settings the topology author baked into the definition.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl TopologyDescriptor {
    /// Load and validate a definition file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDescriptor` if the file cannot be read,
    /// parsed, or fails structural validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidDescriptor {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let descriptor: Self =
            serde_json::from_str(&contents).map_err(|e| ConfigError::InvalidDescriptor {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        descriptor.validate().map_err(|reason| {
            ConfigError::InvalidDescriptor {
                path: path.display().to_string(),
                reason,
            }
        })?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("topology id is empty".to_string());
        }
        if self.name.is_empty() {
            return Err("topology name is empty".to_string());
        }
        if self.components.is_empty() {
            return Err("topology has no components".to_string());
        }
        for component in &self.components {
            if component.name.is_empty() {
                return Err("component with empty name".to_string());
            }
            if component.parallelism == 0 {
                return Err(format!(
                    "component {} has zero parallelism",
                    component.name
                ));
            }
        }
        Ok(())
    }

    /// Total number of instances across all components.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.components.iter().map(|c| c.parallelism).sum()
    }
}

/// Archive kind of the submitted package, derived from the artifact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Jar,
    Tar,
}

impl PackageKind {
    /// Derive the kind from the user artifact's file name: `.jar` artifacts
    /// ship as jar packages, everything else as tarballs.
    #[must_use]
    pub fn from_artifact(artifact: &Path) -> Self {
        match artifact.extension().and_then(|ext| ext.to_str()) {
            Some("jar") => Self::Jar,
            _ => Self::Tar,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::Tar => "tar",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_defn(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("topology.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_definition_file() {
        let dir = TempDir::new().unwrap();
        let path = write_defn(
            &dir,
            r#"{
                "id": "word-count-a1b2",
                "name": "word-count",
                "components": [
                    {"name": "reader", "parallelism": 2},
                    {"name": "counter", "parallelism": 3, "resources": {"cpu": 0.5, "ram_mb": 512}}
                ]
            }"#,
        );

        let descriptor = TopologyDescriptor::load(&path).unwrap();
        assert_eq!(descriptor.name, "word-count");
        assert_eq!(descriptor.components.len(), 2);
        assert_eq!(descriptor.instance_count(), 5);
        assert_eq!(descriptor.components[0].resources.ram_mb, 1024);
        assert_eq!(descriptor.components[1].resources.cpu, 0.5);
    }

    #[test]
    fn rejects_zero_parallelism() {
        let dir = TempDir::new().unwrap();
        let path = write_defn(
            &dir,
            r#"{"id": "t", "name": "t", "components": [{"name": "c", "parallelism": 0}]}"#,
        );

        assert!(matches!(
            TopologyDescriptor::load(&path),
            Err(ConfigError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn rejects_missing_file() {
        assert!(matches!(
            TopologyDescriptor::load(Path::new("/does/not/exist.json")),
            Err(ConfigError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn package_kind_from_artifact_name() {
        assert_eq!(
            PackageKind::from_artifact(Path::new("topology.jar")),
            PackageKind::Jar
        );
        assert_eq!(
            PackageKind::from_artifact(Path::new("topology.tar.gz")),
            PackageKind::Tar
        );
        assert_eq!(PackageKind::from_artifact(Path::new("binary")), PackageKind::Tar);
    }
}
