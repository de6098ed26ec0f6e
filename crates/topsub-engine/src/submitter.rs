//! The submission state machine.
//!
//! One attempt moves through `Init → Validating → Uploading → Launching`
//! and ends in `Committed` or `RollingBack`, always passing through the
//! cleanup that closes every collaborator (`Closed`). The attempt is
//! all-or-nothing across two independently-failing external systems: a
//! failure after the upload retracts both the upload and any partial launch
//! registration.
//!
//! Rollback is only entered from stages that can have created an external
//! side effect. A validation rejection or a state-manager initialization
//! failure goes straight to cleanup: nothing exists yet to retract. Once
//! rollback is entered, both undos run unconditionally; undo is required to
//! be a safe no-op when its resource was never created.
//!
//! The orchestrator performs at most one attempt per invocation and never
//! retries a stage; the validation check against the distributed state
//! manager is the sole duplicate-submission guard.

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use topsub_config::{Config, TopologyDescriptor, keys};
use topsub_spi::adaptor::{RunningState, StateManagerAdaptor};
use topsub_spi::context::RuntimeContext;
use topsub_spi::{Launcher, PackingStrategy, StateManager, Uploader};
use topsub_utils::error::SubmitError;
use topsub_utils::exit_codes::ExitCode;

/// Bounded wait for the running-topology check when the configuration does
/// not override it.
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 5;

/// States of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Validating,
    Uploading,
    Launching,
    Committed,
    RollingBack,
    Closed,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Validating => "validating",
            Self::Uploading => "uploading",
            Self::Launching => "launching",
            Self::Committed => "committed",
            Self::RollingBack => "rolling-back",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one submission attempt. Not persisted; drives the exit code.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub success: bool,
    /// Stage that failed, if any.
    pub failed_stage: Option<Stage>,
    pub error: Option<SubmitError>,
}

impl SubmissionOutcome {
    fn committed() -> Self {
        Self {
            success: true,
            failed_stage: None,
            error: None,
        }
    }

    fn failed(error: SubmitError) -> Self {
        Self {
            success: false,
            failed_stage: Some(failing_stage(&error)),
            error: Some(error),
        }
    }

    /// Exit code the process should report for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

fn failing_stage(error: &SubmitError) -> Stage {
    match error {
        SubmitError::StateManagerInit { .. } => Stage::Init,
        SubmitError::ValidationRejected { .. } => Stage::Validating,
        SubmitError::UploadFailed { .. } => Stage::Uploading,
        SubmitError::LaunchFailed { .. } => Stage::Launching,
    }
}

fn check_timeout(config: &Config) -> Duration {
    let secs = config
        .get_int(keys::STATEMGR_CHECK_TIMEOUT_SECS)
        .and_then(|secs| u64::try_from(secs).ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_CHECK_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Drives one submission attempt over the resolved collaborators.
///
/// The submitter owns its plugin instances for the lifetime of the attempt
/// and guarantees each acquired resource is closed exactly once on every
/// exit path.
pub struct Submitter {
    config: Config,
    topology: TopologyDescriptor,
    statemgr: Box<dyn StateManager>,
    uploader: Box<dyn Uploader>,
    launcher: Box<dyn Launcher>,
    packing: Box<dyn PackingStrategy>,
}

impl Submitter {
    #[must_use]
    pub fn new(
        config: Config,
        topology: TopologyDescriptor,
        statemgr: Box<dyn StateManager>,
        uploader: Box<dyn Uploader>,
        launcher: Box<dyn Launcher>,
        packing: Box<dyn PackingStrategy>,
    ) -> Self {
        Self {
            config,
            topology,
            statemgr,
            uploader,
            launcher,
            packing,
        }
    }

    /// Run the attempt to completion and report its outcome.
    ///
    /// Consumes the submitter: an attempt is never re-run on the same
    /// collaborator instances.
    pub async fn submit(self) -> SubmissionOutcome {
        let Self {
            config,
            topology,
            mut statemgr,
            mut uploader,
            mut launcher,
            packing,
        } = self;
        let name = topology.name.clone();
        info!(topology = %name, stage = %Stage::Init, "starting submission attempt");

        // INIT: bring up the state manager. The adaptor wraps it either way
        // so cleanup has a single close path.
        let mut failure: Option<SubmitError> = None;
        if let Err(e) = statemgr.initialize(&config) {
            failure = Some(SubmitError::StateManagerInit {
                topology: name.clone(),
                reason: e.to_string(),
            });
        }
        let adaptor = StateManagerAdaptor::new(statemgr);

        if failure.is_none() {
            failure = Self::attempt(
                &config,
                &topology,
                &adaptor,
                uploader.as_mut(),
                launcher.as_mut(),
                packing,
            )
            .await
            .err();
        }

        // ROLLING_BACK: only stages that can have created an external side
        // effect compensate. Both undos always run; each must be a no-op if
        // its resource was never created. Undo failures are logged, never
        // escalated: they cannot change the already-failed outcome.
        if failure.as_ref().is_some_and(SubmitError::is_compensable) {
            warn!(topology = %name, stage = %Stage::RollingBack, "retracting partial submission effects");
            if let Err(e) = uploader.undo() {
                warn!(topology = %name, error = %e, "package upload undo failed");
            }
            if let Err(e) = launcher.undo().await {
                warn!(topology = %name, error = %e, "launch undo failed");
            }
        }

        // CLOSED: release every acquired collaborator exactly once,
        // regardless of outcome. The outcome is already decided; nothing
        // here can change it.
        uploader.close();
        launcher.close();
        adaptor.close();

        match failure {
            None => {
                info!(topology = %name, stage = %Stage::Committed, "topology submitted successfully");
                SubmissionOutcome::committed()
            }
            Some(e) => {
                error!(
                    topology = %name,
                    stage = %failing_stage(&e),
                    error = %e,
                    "failed to submit topology"
                );
                SubmissionOutcome::failed(e)
            }
        }
    }

    /// The fallible stages: validate, upload, launch. Returning an error
    /// hands control to the rollback/cleanup logic in `submit`.
    async fn attempt(
        config: &Config,
        topology: &TopologyDescriptor,
        adaptor: &StateManagerAdaptor,
        uploader: &mut dyn Uploader,
        launcher: &mut dyn Launcher,
        mut packing: Box<dyn PackingStrategy>,
    ) -> Result<(), SubmitError> {
        let name = &topology.name;

        // VALIDATING: the running check must confirm the topology absent.
        // Running and indeterminate both refuse the attempt: a duplicate
        // registration is costlier than a wrongly-refused submission.
        let timeout = check_timeout(config);
        debug!(topology = %name, stage = %Stage::Validating, timeout_secs = timeout.as_secs(), "checking running state");
        match adaptor.topology_is_running(name, timeout).await {
            RunningState::Running => {
                return Err(SubmitError::ValidationRejected {
                    topology: name.clone(),
                    reason: "topology is already running".to_string(),
                });
            }
            RunningState::Indeterminate => {
                return Err(SubmitError::ValidationRejected {
                    topology: name.clone(),
                    reason: format!(
                        "running state could not be confirmed within {}s",
                        timeout.as_secs()
                    ),
                });
            }
            RunningState::NotRunning => {}
        }

        // UPLOADING: a missing locator is a failure; the orchestrator never
        // retries (retry policy, if any, lives inside the uploader).
        debug!(topology = %name, stage = %Stage::Uploading, "uploading topology package");
        uploader
            .initialize(config)
            .map_err(|e| SubmitError::UploadFailed {
                topology: name.clone(),
                reason: e.to_string(),
            })?;
        let location = match uploader.upload_package() {
            Ok(Some(location)) => location,
            Ok(None) => {
                return Err(SubmitError::UploadFailed {
                    topology: name.clone(),
                    reason: "uploader returned no package location".to_string(),
                });
            }
            Err(e) => {
                return Err(SubmitError::UploadFailed {
                    topology: name.clone(),
                    reason: e.to_string(),
                });
            }
        };
        info!(topology = %name, location = %location, "package uploaded");

        // LAUNCHING: launch is invoked exactly once, and only with a valid
        // package location in hand.
        packing
            .initialize(config)
            .map_err(|e| SubmitError::LaunchFailed {
                topology: name.clone(),
                reason: e.to_string(),
            })?;
        let ctx = RuntimeContext::new(topology.clone(), adaptor.clone(), location, packing);
        launcher
            .initialize(config)
            .map_err(|e| SubmitError::LaunchFailed {
                topology: name.clone(),
                reason: e.to_string(),
            })?;
        debug!(topology = %name, stage = %Stage::Launching, "launching topology");
        match launcher.launch(&ctx).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SubmitError::LaunchFailed {
                topology: name.clone(),
                reason: "launcher reported failure".to_string(),
            }),
            Err(e) => Err(SubmitError::LaunchFailed {
                topology: name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
