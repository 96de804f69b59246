//! Capture subprocess configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Packet-capture subprocess configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CaptureConfig {
    /// Capture utility to spawn; resolved through `PATH`.
    #[validate(length(min = 1))]
    #[serde(default = "default_program")]
    pub program: String,

    /// Pause before respawning a failed or exited capture (milliseconds).
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_restart_backoff")]
    pub restart_backoff_ms: u64,
}

fn default_program() -> String {
    "tcpdump".into()
}

fn default_restart_backoff() -> u64 {
    3000
}

impl CaptureConfig {
    pub fn restart_backoff(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            restart_backoff_ms: default_restart_backoff(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_bounds() {
        let mut config = CaptureConfig::default();
        assert_eq!(config.restart_backoff(), Duration::from_secs(3));
        config.restart_backoff_ms = 10;
        assert!(config.validate().is_err());
        config.restart_backoff_ms = 120_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_program_rejected() {
        let config = CaptureConfig {
            program: String::new(),
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
