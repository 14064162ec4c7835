//! Test environment handle and its background loader.
//!
//! The loader plays the part of a browser page load: it runs on its own
//! thread, takes a while, and reports completion through a callback. The
//! callback is the producer side of the session's ready gate.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Name of the loader thread
pub const LOADER_THREAD_NAME: &str = "environment-loader";

/// Handle to a loaded environment, handed to every test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: Uuid,
    pub name: String,
    pub loaded_at: DateTime<Utc>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            loaded_at: Utc::now(),
        }
    }
}

/// Errors starting the loader
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("environment loader has no loaded callback")]
    NoCallback,
    #[error("failed to spawn environment loader thread")]
    Spawn(#[source] std::io::Error),
}

/// Invoked once with the loaded environment.
pub type LoadedCallback = Box<dyn FnOnce(Environment) + Send + 'static>;

/// Checks run on the loader thread before the environment is reported.
pub type VerifyHook = Box<dyn FnOnce(&Environment) -> anyhow::Result<()> + Send + 'static>;

/// Builder for the background environment load.
pub struct EnvironmentLoader {
    name: String,
    load_delay: Duration,
    verify: Option<VerifyHook>,
    on_loaded: Option<LoadedCallback>,
}

impl EnvironmentLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            load_delay: Duration::ZERO,
            verify: None,
            on_loaded: None,
        }
    }

    /// Simulated time the load takes.
    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Check the environment before reporting it. A failing check suppresses
    /// the loaded callback.
    pub fn verify<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&Environment) -> anyhow::Result<()> + Send + 'static,
    {
        self.verify = Some(Box::new(check));
        self
    }

    pub fn on_loaded<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Environment) + Send + 'static,
    {
        self.on_loaded = Some(Box::new(callback));
        self
    }

    /// Start loading on a dedicated thread.
    ///
    /// The loaded callback runs at most once, on the loader thread.
    pub fn spawn(self) -> Result<JoinHandle<()>, LoadError> {
        let Self {
            name,
            load_delay,
            verify,
            on_loaded,
        } = self;
        let on_loaded = on_loaded.ok_or(LoadError::NoCallback)?;

        thread::Builder::new()
            .name(LOADER_THREAD_NAME.to_string())
            .spawn(move || {
                debug!("Loading environment {:?} ({:?})", name, load_delay);
                if !load_delay.is_zero() {
                    thread::sleep(load_delay);
                }

                let environment = Environment::new(name);
                if let Some(check) = verify {
                    if let Err(e) = check(&environment) {
                        error!(
                            "Environment {} failed verification, not publishing: {:#}",
                            environment.name, e
                        );
                        return;
                    }
                }

                info!("✅ Environment {} loaded ({})", environment.name, environment.id);
                on_loaded(environment);
            })
            .map_err(LoadError::Spawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_loader_reports_environment_once() {
        let (tx, rx) = mpsc::channel();
        let handle = EnvironmentLoader::new("env-42")
            .load_delay(Duration::from_millis(10))
            .on_loaded(move |env| tx.send(env).unwrap())
            .spawn()
            .unwrap();

        handle.join().unwrap();
        let env = rx.recv().unwrap();
        assert_eq!(env.name, "env-42");
        assert!(!env.id.is_nil());
        // Sender was moved into the callback and dropped after one call.
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_loader_runs_on_named_thread() {
        let (tx, rx) = mpsc::channel();
        EnvironmentLoader::new("env")
            .on_loaded(move |_| {
                tx.send(thread::current().name().map(str::to_string)).unwrap()
            })
            .spawn()
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(rx.recv().unwrap().as_deref(), Some(LOADER_THREAD_NAME));
    }

    #[test]
    fn test_failed_verification_skips_callback() {
        let (tx, rx) = mpsc::channel::<Environment>();
        EnvironmentLoader::new("env")
            .verify(|_| anyhow::bail!("unexpected class loader"))
            .on_loaded(move |env| tx.send(env).unwrap())
            .spawn()
            .unwrap()
            .join()
            .unwrap();

        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_spawn_without_callback_fails() {
        let err = EnvironmentLoader::new("env").spawn().unwrap_err();
        assert!(matches!(err, LoadError::NoCallback));
    }

    #[test]
    fn test_environment_serializes() {
        let env = Environment::new("env-42");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["name"], "env-42");
        assert_eq!(json["id"], env.id.to_string());

        let back: Environment = serde_json::from_value(json).unwrap();
        assert_eq!(back, env);
    }
}
