//! Probe acceptance configuration.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct FilterConfig {
    /// Source networks whose probes are never logged.
    #[validate(custom(function = validation::validate_cidr_list))]
    #[serde(default)]
    pub ignore_sources: Vec<IpNetwork>,

    /// Drop probes originating from loopback addresses.
    #[serde(default)]
    pub ignore_loopback: bool,
}
