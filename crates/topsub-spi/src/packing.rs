//! Packing plan data model.
//!
//! A plan assigns every component instance to a container together with its
//! resource ask. Produced by a [`PackingStrategy`](crate::PackingStrategy),
//! consumed by launchers, opaque to the orchestrator.

use serde::{Deserialize, Serialize};

/// Placement of one component instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InstancePlan {
    pub component: String,
    /// Globally unique task id within the topology.
    pub task_id: u32,
    pub cpu: f64,
    pub ram_mb: u64,
}

/// All instances assigned to one container.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContainerPlan {
    pub id: u32,
    pub instances: Vec<InstancePlan>,
}

impl ContainerPlan {
    /// Summed CPU ask of the container's instances.
    #[must_use]
    pub fn total_cpu(&self) -> f64 {
        self.instances.iter().map(|i| i.cpu).sum()
    }

    /// Summed RAM ask of the container's instances, in megabytes.
    #[must_use]
    pub fn total_ram_mb(&self) -> u64 {
        self.instances.iter().map(|i| i.ram_mb).sum()
    }
}

/// The complete placement decision for one topology.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackingPlan {
    pub containers: Vec<ContainerPlan>,
}

impl PackingPlan {
    /// Total number of placed instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.containers.iter().map(|c| c.instances.len()).sum()
    }
}
