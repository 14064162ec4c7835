//! One-shot readiness gate and the test-session plumbing around it.
//!
//! A background loader prepares a test environment and publishes it exactly
//! once; test consumers block on the gate until it arrives:
//!
//! ```ignore
//! let mut session = TestSession::new(SessionConfig::from_env());
//! session.start()?;                       // loader thread publishes when done
//! let report = run_suite(&session, &builtin_cases())?;
//! ```

pub mod config;
pub mod environment;
pub mod gate;
pub mod handshake;
pub mod session;
pub mod suite;

#[cfg(test)]
mod test_support;

pub use config::SessionConfig;
pub use environment::{Environment, EnvironmentLoader, LoadError};
pub use gate::{AsyncReadyGate, GateError, GateResult, ReadyGate};
pub use session::TestSession;
pub use suite::{CaseRegistry, SuiteReport, TestCase};
