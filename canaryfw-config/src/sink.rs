//! Synthetic log sink configuration.
//!
//! Parameters for the firewall-style records:
//! - Target file (conventionally the kernel log)
//! - Log prefixes for TCP and UDP records
//! - Hostname shown in the syslog header

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SinkConfig {
    /// Append-only text file receiving synthetic records.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Log prefix of TCP SYN records.
    #[validate(custom(function = validation::validate_tag))]
    #[serde(default = "default_tcp_tag")]
    pub tcp_tag: String,

    /// Log prefix of UDP records.
    #[validate(custom(function = validation::validate_tag))]
    #[serde(default = "default_udp_tag")]
    pub udp_tag: String,

    /// Hostname override; the local hostname is used when unset.
    #[serde(default)]
    pub hostname: Option<String>,
}

fn default_path() -> PathBuf {
    PathBuf::from("/var/log/kern.log")
}

fn default_tcp_tag() -> String {
    "canaryfw".into()
}

fn default_udp_tag() -> String {
    "IPTables-Dropped".into()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            tcp_tag: default_tcp_tag(),
            udp_tag: default_udp_tag(),
            hostname: None,
        }
    }
}
