//! # canaryfw Configuration System
//!
//! Layered configuration for the synthetic probe log emitter.
//!
//! ## Features
//! - **Safe defaults**: with no file and no environment overrides the
//!   emitter behaves exactly like the fixed deployment (tcpdump on the
//!   default-route interface, records appended to `/var/log/kern.log`)
//! - **Validation**: interface names, CIDR lists and log prefixes are
//!   checked before anything is spawned
//! - **Environment Awareness**: per-environment override files and
//!   `CANARYFW_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod capture;
mod error;
mod filter;
mod host;
mod sink;
mod validation;

pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use filter::FilterConfig;
pub use host::HostConfig;
pub use sink::SinkConfig;

/// Base configuration file, relative to the working directory.
pub const BASE_CONFIG_FILE: &str = "config/canaryfw.yaml";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct CanaryConfig {
    /// Host interface and address discovery.
    #[validate(nested)]
    #[serde(default)]
    pub host: HostConfig,

    /// Capture subprocess parameters.
    #[validate(nested)]
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Synthetic record format and destination.
    #[validate(nested)]
    #[serde(default)]
    pub sink: SinkConfig,

    /// Probe acceptance policy.
    #[validate(nested)]
    #[serde(default)]
    pub filter: FilterConfig,
}

impl CanaryConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/canaryfw.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - Environment‑specific overrides,
    ///    environment taken from `CANARYFW_ENV` (default `production`).
    /// 4. `CANARYFW_*` environment variables, `__` separating sections.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(CanaryConfig::default()));

        if Path::new(BASE_CONFIG_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_CONFIG_FILE));
        } else {
            debug!("{BASE_CONFIG_FILE} not found, using default configuration");
        }

        let env = std::env::var("CANARYFW_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific path, plus environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment = Figment::from(Serialized::defaults(CanaryConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed("CANARYFW_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::net::Ipv4Addr;

    #[test]
    fn full_config_validation() {
        let config = CanaryConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn defaults_without_files() {
        Jail::expect_with(|_jail| {
            let config = CanaryConfig::load().unwrap();
            assert_eq!(config.capture.program, "tcpdump");
            assert_eq!(config.capture.restart_backoff_ms, 3000);
            assert_eq!(config.sink.path, PathBuf::from("/var/log/kern.log"));
            assert_eq!(config.host.fallback_interface, "eth0");
            assert!(config.host.interface.is_none());
            assert!(config.filter.ignore_sources.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_and_environment_layers() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/canaryfw.yaml",
                r#"
sink:
  path: /tmp/kern.log
  hostname: canary-01
filter:
  ignore_sources: ["10.0.0.0/8"]
"#,
            )?;
            jail.create_file(
                "config/staging.yaml",
                "host:\n  address: 192.168.1.10\n",
            )?;
            jail.set_env("CANARYFW_ENV", "staging");
            jail.set_env("CANARYFW_CAPTURE__RESTART_BACKOFF_MS", "500");

            let config = CanaryConfig::load().unwrap();
            assert_eq!(config.sink.path, PathBuf::from("/tmp/kern.log"));
            assert_eq!(config.sink.hostname.as_deref(), Some("canary-01"));
            assert_eq!(config.sink.tcp_tag, "canaryfw");
            assert_eq!(config.filter.ignore_sources.len(), 1);
            assert_eq!(config.host.address, Some(Ipv4Addr::new(192, 168, 1, 10)));
            assert_eq!(config.capture.restart_backoff_ms, 500);
            Ok(())
        });
    }

    #[test]
    fn invalid_file_reports_field() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "capture:\n  restart_backoff_ms: 1\n")?;
            let err = CanaryConfig::load_from_path("bad.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains("capture.restart_backoff_ms"));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file() {
        let err = CanaryConfig::load_from_path("/nonexistent/canaryfw.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
