//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration modules.

use ipnetwork::IpNetwork;
use validator::ValidationError;

/// Validate that the provided CIDR list does not contain any invalid ranges.
pub fn validate_cidr_list(cidrs: &[IpNetwork]) -> Result<(), ValidationError> {
    if cidrs.iter().any(|n| match n {
        IpNetwork::V4(net) => net.ip().octets() == [0, 0, 0, 0],
        IpNetwork::V6(_) => false,
    }) {
        return Err(ValidationError::new("invalid_cidr"));
    }
    Ok(())
}

/// Validate that an interface name follows Linux naming conventions
/// (`IFNAMSIZ` minus the terminator, VLAN dots and bridge dashes allowed).
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new(r"^[a-zA-Z0-9_.\-]{1,15}$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;

    if re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate a syslog log prefix: one non-empty whitespace-free token.
pub fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    if !tag.is_empty() && !tag.chars().any(char::is_whitespace) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_tag"))
    }
}
