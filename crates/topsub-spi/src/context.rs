//! Per-attempt runtime context.

use url::Url;

use topsub_config::TopologyDescriptor;

use crate::adaptor::StateManagerAdaptor;
use crate::PackingStrategy;

/// Values meaningful only during one submission attempt, built after
/// validation succeeds and handed to the launcher. Never persisted;
/// discarded when the attempt ends.
pub struct RuntimeContext {
    pub topology_id: String,
    pub topology_name: String,
    pub topology: TopologyDescriptor,
    /// Shared handle to the state-manager façade; launchers use it to
    /// register the topology as running.
    pub statemgr: StateManagerAdaptor,
    /// Where the uploader placed the deployable package.
    pub package_location: Url,
    /// Placement strategy the launcher consults for the packing plan.
    pub packing: Box<dyn PackingStrategy>,
}

impl RuntimeContext {
    /// Build the context for one attempt from the descriptor and the
    /// collaborator handles the launcher needs.
    #[must_use]
    pub fn new(
        topology: TopologyDescriptor,
        statemgr: StateManagerAdaptor,
        package_location: Url,
        packing: Box<dyn PackingStrategy>,
    ) -> Self {
        Self {
            topology_id: topology.id.clone(),
            topology_name: topology.name.clone(),
            topology,
            statemgr,
            package_location,
            packing,
        }
    }
}
