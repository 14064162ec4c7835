//! Test session: owns the ready gate for one run.
//!
//! Each session creates its own gate, so repeated runs in the same process
//! never see each other's environment.

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::environment::{Environment, EnvironmentLoader, VerifyHook};
use crate::gate::ReadyGate;

/// One test run: a background environment load and the gate its consumers
/// wait on.
pub struct TestSession {
    config: SessionConfig,
    gate: Arc<ReadyGate<Environment>>,
    verify: Option<VerifyHook>,
    loader: Option<JoinHandle<()>>,
}

impl TestSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            gate: Arc::new(ReadyGate::new()),
            verify: None,
            loader: None,
        }
    }

    /// Check to run against the environment before it is published.
    pub fn with_verifier<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&Environment) -> Result<()> + Send + 'static,
    {
        self.verify = Some(Box::new(check));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared handle to the gate, for additional consumers.
    pub fn gate(&self) -> Arc<ReadyGate<Environment>> {
        Arc::clone(&self.gate)
    }

    pub fn is_started(&self) -> bool {
        self.loader.is_some()
    }

    /// Start loading the environment in the background.
    ///
    /// The loader's completion callback is the gate's only producer.
    pub fn start(&mut self) -> Result<()> {
        if self.is_started() {
            bail!("Test session already started");
        }

        let gate = Arc::clone(&self.gate);
        let mut loader = EnvironmentLoader::new(self.config.environment_name.clone())
            .load_delay(self.config.load_delay)
            .on_loaded(move |environment| {
                if let Err(e) = gate.publish(environment) {
                    warn!("Environment loaded twice: {}", e);
                }
            });
        if let Some(check) = self.verify.take() {
            loader = loader.verify(check);
        }

        let handle = loader
            .spawn()
            .context("Failed to start environment loader")?;
        self.loader = Some(handle);

        info!(
            "🚀 Loading environment {} (timeout: {:?})",
            self.config.environment_name, self.config.wait_timeout
        );
        Ok(())
    }

    /// Wait for the loaded environment, bounded by the configured timeout.
    pub fn environment(&self) -> Result<Environment> {
        if !self.is_started() && !self.gate.is_published() {
            warn!("Waiting on an environment whose loader was never started");
        }
        self.gate
            .wait_for(self.config.wait_timeout)
            .with_context(|| {
                format!(
                    "Environment {} was not loaded",
                    self.config.environment_name
                )
            })
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        // Only join a loader that has already finished; an unfinished one
        // would hold up the drop for its full load delay.
        if let Some(handle) = self.loader.take() {
            if handle.is_finished() && handle.join().is_err() {
                warn!("Environment loader panicked");
            }
        }
    }
}
