mod args;

pub use args::{Cli, Commands, SessionArgs};

use readygate::config::SessionConfig;

impl SessionArgs {
    /// Environment-derived config with these flags applied on top.
    pub fn to_config(&self) -> SessionConfig {
        SessionConfig::from_env().with_overrides(self.timeout_ms, self.load_delay_ms)
    }
}
