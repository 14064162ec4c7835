//! Async gate for tokio tasks.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use super::error::{GateError, GateResult};

/// Tokio counterpart of [`ReadyGate`](super::ReadyGate).
///
/// The slot sits behind a short-lived mutex that is never held across an
/// `.await`. Waiters register with `ready` before they look at the slot, so
/// a publish that lands between the check and the suspension still wakes
/// them.
pub struct AsyncReadyGate<T> {
    slot: Mutex<Option<T>>,
    ready: Notify,
}

impl<T> AsyncReadyGate<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Notify::new(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.lock().is_some()
    }

    /// Publish `value` and wake every waiter.
    ///
    /// The check and the store share one critical section, so two racing
    /// publishers cannot both win.
    pub fn publish(&self, value: T) -> GateResult<()> {
        let mut slot = self.lock();
        if slot.is_some() {
            warn!("Rejected second publish on async ready gate");
            return Err(GateError::AlreadyPublished);
        }
        *slot = Some(value);
        drop(slot);

        self.ready.notify_waiters();
        debug!("Async ready gate published");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> AsyncReadyGate<T> {
    pub fn try_get(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Wait until the gate is published.
    ///
    /// Resolves immediately when a value is already present. Without a
    /// publish this future never completes.
    pub async fn wait(&self) -> T {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.try_get() {
                return value;
            }
            notified.await;
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> GateResult<T> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!("Async ready gate not published after {:?}", timeout);
                Err(GateError::Timeout { waited: timeout })
            }
        }
    }

    /// Wait with an optional deadline. `None` waits forever.
    pub async fn wait_for(&self, timeout: Option<Duration>) -> GateResult<T> {
        match timeout {
            Some(timeout) => self.wait_timeout(timeout).await,
            None => Ok(self.wait().await),
        }
    }
}

impl<T> Default for AsyncReadyGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AsyncReadyGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncReadyGate")
            .field("published", &self.is_published())
            .finish()
    }
}
