//! Shared helpers for tests that touch process-wide state.

use std::sync::{Mutex, OnceLock};

/// Serializes tests that read or write environment variables.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Restores an environment variable to its previous value on drop.
pub struct EnvVarRestore {
    name: &'static str,
    prev: Option<String>,
}

impl EnvVarRestore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            prev: std::env::var(name).ok(),
        }
    }
}

impl Drop for EnvVarRestore {
    fn drop(&mut self) {
        match &self.prev {
            Some(value) => std::env::set_var(self.name, value),
            None => std::env::remove_var(self.name),
        }
    }
}
