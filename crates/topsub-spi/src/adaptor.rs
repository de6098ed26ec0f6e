//! Bounded-wait façade over the distributed state manager.
//!
//! The raw running check is asynchronous with no upper bound of its own; the
//! adaptor converts it into a call bounded by a timeout and folds both the
//! timeout and a store error into [`RunningState::Indeterminate`].
//! Indeterminate means "not confirmed absent": the orchestrator refuses to
//! submit, preferring a wrongly-refused attempt over a duplicate
//! registration.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use topsub_utils::error::StateError;

use crate::StateManager;

/// Three-valued result of the bounded running check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    /// The topology is confirmed running.
    Running,
    /// The topology is confirmed not running; submission may proceed.
    NotRunning,
    /// The check timed out or the store failed; not confirmed absent.
    Indeterminate,
}

/// Thin façade exposing the two operations the submission flow needs from
/// the state manager: the bounded existence check, and (on behalf of
/// launchers) running-state registration.
///
/// Cloning shares the underlying state manager; `close` is invoked exactly
/// once per attempt by the orchestrator's cleanup phase.
#[derive(Clone)]
pub struct StateManagerAdaptor {
    inner: Arc<dyn StateManager>,
}

impl StateManagerAdaptor {
    /// Wrap an already-initialized state manager.
    #[must_use]
    pub fn new(statemgr: Box<dyn StateManager>) -> Self {
        Self {
            inner: Arc::from(statemgr),
        }
    }

    /// Check whether `name` is running, waiting at most `timeout`.
    pub async fn topology_is_running(&self, name: &str, timeout: Duration) -> RunningState {
        match tokio::time::timeout(timeout, self.inner.is_topology_running(name)).await {
            Ok(Ok(true)) => RunningState::Running,
            Ok(Ok(false)) => RunningState::NotRunning,
            Ok(Err(e)) => {
                warn!(topology = %name, error = %e, "running check failed");
                RunningState::Indeterminate
            }
            Err(_) => {
                warn!(
                    topology = %name,
                    timeout_secs = timeout.as_secs(),
                    "running check timed out"
                );
                RunningState::Indeterminate
            }
        }
    }

    /// Register `name` as running.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn register_running(&self, name: &str) -> Result<(), StateError> {
        self.inner.register_running(name).await
    }

    /// Clear the running registration for `name`.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub async fn clear_running(&self, name: &str) -> Result<(), StateError> {
        self.inner.clear_running(name).await
    }

    /// Close the underlying state manager.
    pub fn close(&self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use topsub_config::Config;

    /// State manager stub whose running check answers after a fixed delay.
    struct SlowStateManager {
        delay: Duration,
        answer: Result<bool, ()>,
    }

    #[async_trait]
    impl StateManager for SlowStateManager {
        fn initialize(&mut self, _config: &Config) -> Result<(), StateError> {
            Ok(())
        }

        async fn is_topology_running(&self, _name: &str) -> Result<bool, StateError> {
            tokio::time::sleep(self.delay).await;
            self.answer
                .map_err(|()| StateError::Unavailable("store down".to_string()))
        }

        async fn register_running(&self, _name: &str) -> Result<(), StateError> {
            Ok(())
        }

        async fn clear_running(&self, _name: &str) -> Result<(), StateError> {
            Ok(())
        }

        fn close(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_answers_pass_through() {
        let adaptor = StateManagerAdaptor::new(Box::new(SlowStateManager {
            delay: Duration::from_millis(10),
            answer: Ok(true),
        }));
        let state = adaptor
            .topology_is_running("job", Duration::from_secs(5))
            .await;
        assert_eq!(state, RunningState::Running);

        let adaptor = StateManagerAdaptor::new(Box::new(SlowStateManager {
            delay: Duration::from_millis(10),
            answer: Ok(false),
        }));
        let state = adaptor
            .topology_is_running("job", Duration::from_secs(5))
            .await;
        assert_eq!(state, RunningState::NotRunning);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_check_is_indeterminate() {
        let adaptor = StateManagerAdaptor::new(Box::new(SlowStateManager {
            delay: Duration::from_secs(60),
            answer: Ok(false),
        }));
        let state = adaptor
            .topology_is_running("job", Duration::from_secs(5))
            .await;
        assert_eq!(state, RunningState::Indeterminate);
    }

    #[tokio::test(start_paused = true)]
    async fn store_error_is_indeterminate() {
        let adaptor = StateManagerAdaptor::new(Box::new(SlowStateManager {
            delay: Duration::from_millis(10),
            answer: Err(()),
        }));
        let state = adaptor
            .topology_is_running("job", Duration::from_secs(5))
            .await;
        assert_eq!(state, RunningState::Indeterminate);
    }
}
