//! One-shot readiness gates.
//!
//! A gate starts empty, is published exactly once by a producer, and hands
//! the published value to every consumer that waits on it:
//!
//! ```text
//! Empty ──publish(v)──▶ Published(v)   (terminal)
//! ```
//!
//! Two flavours are provided:
//! - [`ReadyGate`]: blocking, for plain OS threads (mutex + condition variable)
//! - [`AsyncReadyGate`]: for tokio tasks (mutex + `Notify`)
//!
//! Both reject a second publish with [`GateError::AlreadyPublished`] and keep
//! the first value. An unbounded `wait` blocks forever if nothing is ever
//! published; use `wait_timeout` wherever the producer can fail.

mod blocking;
mod error;
mod shared;

pub use blocking::ReadyGate;
pub use error::{GateError, GateResult};
pub use shared::AsyncReadyGate;
