//! Blocking gate for OS threads.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::{GateError, GateResult};

/// One-shot publish/wait cell shared between a producer thread and any
/// number of consumer threads.
///
/// The slot is read and written only under `slot`'s lock, so a consumer can
/// never observe a partially published value, and the emptiness check in
/// [`wait`](Self::wait) and the condvar registration happen atomically with
/// respect to [`publish`](Self::publish). A waiter that arrives before the
/// producer therefore cannot miss the wake-up.
pub struct ReadyGate<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> ReadyGate<T> {
    /// Create an empty gate.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Returns true once a value has been published. Never blocks on the
    /// value itself, only on the short critical section.
    pub fn is_published(&self) -> bool {
        self.lock().is_some()
    }

    /// Publish `value` and wake every waiter.
    ///
    /// Only the first call succeeds. Later calls, including ones racing the
    /// first on another thread, return [`GateError::AlreadyPublished`] and
    /// leave the stored value untouched.
    pub fn publish(&self, value: T) -> GateResult<()> {
        let mut slot = self.lock();
        if slot.is_some() {
            warn!("Rejected second publish on ready gate");
            return Err(GateError::AlreadyPublished);
        }
        *slot = Some(value);
        drop(slot);

        self.ready.notify_all();
        debug!("Ready gate published");
        Ok(())
    }

    // A panic elsewhere cannot leave `Option<T>` half-written, so a poisoned
    // lock still guards a consistent slot.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> ReadyGate<T> {
    /// Return the value if it has been published, without waiting.
    pub fn try_get(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Block until the gate is published and return a copy of the value.
    ///
    /// Returns immediately when the gate is already published. There is no
    /// deadline: if the producer never publishes, this never returns. Prefer
    /// [`wait_timeout`](Self::wait_timeout) when the producer can fail.
    pub fn wait(&self) -> T {
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.as_ref() {
                return value.clone();
            }
            debug!("Waiting for ready gate");
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// A budget too large to express as a deadline waits without one.
    pub fn wait_timeout(&self, timeout: Duration) -> GateResult<T> {
        let started = Instant::now();
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }
        let Some(deadline) = started.checked_add(timeout) else {
            drop(slot);
            return Ok(self.wait());
        };
        loop {
            if let Some(value) = slot.as_ref() {
                return Ok(value.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                let waited = now - started;
                warn!("Ready gate not published after {:?}", waited);
                return Err(GateError::Timeout { waited });
            }
            // Spurious wake-ups and early returns just go around the loop
            // with the remaining budget.
            slot = self
                .ready
                .wait_timeout(slot, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// Wait with an optional deadline. `None` waits forever.
    pub fn wait_for(&self, timeout: Option<Duration>) -> GateResult<T> {
        match timeout {
            Some(timeout) => self.wait_timeout(timeout),
            None => Ok(self.wait()),
        }
    }
}

impl<T> Default for ReadyGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReadyGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyGate")
            .field("published", &self.is_published())
            .finish()
    }
}
