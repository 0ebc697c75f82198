//! Configuration schema for labhost
//!
//! Defines the structure and defaults for the config.json file and maps the
//! settings onto the policy values the host and BMC layers take.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bmc::{PowerOptions, RedfishPaths};
use crate::host::{ContainerSpec, KeyPaths, PingProbe, RemoteOptions, Ssh2Connector};
use crate::retry::RetryPolicy;

/// Main configuration structure for labhost
///
/// Serialized to/from `~/.config/labhost/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Config file version for migrations
    pub version: u32,

    /// SSH user when a node doesn't name one (default: "core")
    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// Primary private key (default: ~/.ssh/id_rsa)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<PathBuf>,

    /// Fallback private key tried after the primary is rejected
    /// (default: ~/.ssh/id_ed25519)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_fallback_key_path: Option<PathBuf>,

    /// TCP connect timeout per SSH attempt
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Wait between failed SSH connect attempts
    #[serde(default = "default_connect_retry_delay_secs")]
    pub connect_retry_delay_secs: u64,

    /// Give up connecting after this many attempts (default: never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_max_attempts: Option<u32>,

    /// Timeout of each liveness ping
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Whole-sequence attempts for booting an ISO
    #[serde(default = "default_boot_attempts")]
    pub boot_attempts: u32,

    #[serde(default = "default_boot_retry_delay_secs")]
    pub boot_retry_delay_secs: u64,

    /// Wait after the restart that starts the ISO boot
    #[serde(default = "default_boot_settle_secs")]
    pub boot_settle_secs: u64,

    #[serde(default = "default_cold_boot_off_delay_secs")]
    pub cold_boot_off_delay_secs: u64,

    #[serde(default = "default_cold_boot_on_delay_secs")]
    pub cold_boot_on_delay_secs: u64,

    /// Timeout of each Redfish HTTP request
    #[serde(default = "default_bmc_request_timeout_secs")]
    pub bmc_request_timeout_secs: u64,

    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(default = "default_container_image")]
    pub container_image: String,

    #[serde(default = "default_redfish_system_id")]
    pub redfish_system_id: String,

    #[serde(default = "default_redfish_manager_id")]
    pub redfish_manager_id: String,

    #[serde(default = "default_redfish_media_id")]
    pub redfish_media_id: String,
}

fn default_ssh_user() -> String {
    "core".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_connect_retry_delay_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    1
}

fn default_boot_attempts() -> u32 {
    10
}

fn default_boot_retry_delay_secs() -> u64 {
    60
}

fn default_boot_settle_secs() -> u64 {
    10
}

fn default_cold_boot_off_delay_secs() -> u64 {
    10
}

fn default_cold_boot_on_delay_secs() -> u64 {
    5
}

fn default_bmc_request_timeout_secs() -> u64 {
    30
}

fn default_container_name() -> String {
    ContainerSpec::default().name
}

fn default_container_image() -> String {
    ContainerSpec::default().image
}

fn default_redfish_system_id() -> String {
    RedfishPaths::default().system_id
}

fn default_redfish_manager_id() -> String {
    RedfishPaths::default().manager_id
}

fn default_redfish_media_id() -> String {
    RedfishPaths::default().media_id
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            ssh_user: default_ssh_user(),
            ssh_port: default_ssh_port(),
            ssh_key_path: None,
            ssh_fallback_key_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            connect_retry_delay_secs: default_connect_retry_delay_secs(),
            connect_max_attempts: None,
            probe_timeout_secs: default_probe_timeout_secs(),
            boot_attempts: default_boot_attempts(),
            boot_retry_delay_secs: default_boot_retry_delay_secs(),
            boot_settle_secs: default_boot_settle_secs(),
            cold_boot_off_delay_secs: default_cold_boot_off_delay_secs(),
            cold_boot_on_delay_secs: default_cold_boot_on_delay_secs(),
            bmc_request_timeout_secs: default_bmc_request_timeout_secs(),
            container_name: default_container_name(),
            container_image: default_container_image(),
            redfish_system_id: default_redfish_system_id(),
            redfish_manager_id: default_redfish_manager_id(),
            redfish_media_id: default_redfish_media_id(),
        }
    }
}

impl Config {
    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), String> {
        if self.boot_attempts == 0 {
            return Err("boot_attempts must be at least 1".to_string());
        }
        if self.connect_max_attempts == Some(0) {
            return Err("connect_max_attempts must be at least 1 when set".to_string());
        }
        if self.container_name.trim().is_empty() {
            return Err("container_name must not be empty".to_string());
        }
        if self.ssh_user.trim().is_empty() {
            return Err("ssh_user must not be empty".to_string());
        }
        Ok(())
    }

    pub fn connect_retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_secs(self.connect_retry_delay_secs);
        match self.connect_max_attempts {
            Some(attempts) => RetryPolicy::bounded(attempts, delay),
            None => RetryPolicy::unbounded(delay),
        }
    }

    pub fn boot_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::bounded(
            self.boot_attempts,
            Duration::from_secs(self.boot_retry_delay_secs),
        )
    }

    /// Configured key files, with `~/.ssh` defaults for unset ones
    pub fn key_paths(&self) -> KeyPaths {
        KeyPaths::with_overrides(
            self.ssh_key_path.as_deref(),
            self.ssh_fallback_key_path.as_deref(),
        )
    }

    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            connect_retry: self.connect_retry_policy(),
            key_paths: self.key_paths(),
            ..RemoteOptions::default()
        }
    }

    pub fn ssh_connector(&self) -> Ssh2Connector {
        Ssh2Connector::new(Duration::from_secs(self.connect_timeout_secs))
    }

    pub fn probe(&self) -> PingProbe {
        PingProbe::new(Duration::from_secs(self.probe_timeout_secs))
    }

    pub fn power_options(&self) -> PowerOptions {
        PowerOptions {
            boot_retry: self.boot_retry_policy(),
            settle: Duration::from_secs(self.boot_settle_secs),
            off_delay: Duration::from_secs(self.cold_boot_off_delay_secs),
            on_delay: Duration::from_secs(self.cold_boot_on_delay_secs),
        }
    }

    pub fn bmc_request_timeout(&self) -> Duration {
        Duration::from_secs(self.bmc_request_timeout_secs)
    }

    pub fn redfish_paths(&self) -> RedfishPaths {
        RedfishPaths {
            system_id: self.redfish_system_id.clone(),
            manager_id: self.redfish_manager_id.clone(),
            media_id: self.redfish_media_id.clone(),
        }
    }

    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.container_name, &self.container_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Backoff;

    #[test]
    fn defaults_match_lab_conventions() {
        let config = Config::default();
        assert_eq!(config.ssh_user, "core");
        assert_eq!(config.ssh_port, 22);

        let connect = config.connect_retry_policy();
        assert_eq!(connect.max_attempts, None);
        assert_eq!(connect.backoff, Backoff::Fixed(Duration::from_secs(10)));

        let boot = config.boot_retry_policy();
        assert_eq!(boot.max_attempts, Some(10));
        assert_eq!(boot.backoff, Backoff::Fixed(Duration::from_secs(60)));
    }

    #[test]
    fn empty_object_deserializes_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"version": 1}"#).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{"version": 1, "ssh_usr": "root"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn bounded_connect_policy_from_config() {
        let config = Config {
            connect_max_attempts: Some(5),
            connect_retry_delay_secs: 2,
            ..Config::default()
        };
        let policy = config.remote_options().connect_retry;
        assert_eq!(policy.max_attempts, Some(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
    }

    #[test]
    fn power_options_from_config() {
        let config = Config {
            boot_attempts: 3,
            cold_boot_off_delay_secs: 20,
            ..Config::default()
        };
        let options = config.power_options();
        assert_eq!(options.boot_retry.max_attempts, Some(3));
        assert_eq!(options.off_delay, Duration::from_secs(20));
        assert_eq!(options.on_delay, Duration::from_secs(5));
    }

    #[test]
    fn key_overrides_flow_into_remote_options() {
        let config = Config {
            ssh_key_path: Some(PathBuf::from("/keys/lab_rsa")),
            ..Config::default()
        };
        let paths = config.remote_options().key_paths;
        assert_eq!(paths.primary, PathBuf::from("/keys/lab_rsa"));
        assert!(paths.fallback.ends_with("id_ed25519"));
    }

    #[test]
    fn validation_catches_zero_attempts() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            boot_attempts: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            connect_max_attempts: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn redfish_and_container_settings() {
        let config = Config {
            redfish_system_id: "1".to_string(),
            container_image: "registry.lab/tools:1".to_string(),
            ..Config::default()
        };
        assert_eq!(config.redfish_paths().system(), "/redfish/v1/Systems/1");
        assert_eq!(config.container_spec().image, "registry.lab/tools:1");
        assert_eq!(config.container_spec().name, "bf");
    }
}
