//! Node inventory schema
//!
//! Data structures for nodes.json: one entry per lab machine.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::host::{KeyPaths, SshConfigMatch};

/// Out-of-band controller of a node
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BmcConfig {
    /// BMC address; derived from the node address when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub user: String,

    pub password: String,
}

impl std::fmt::Debug for BmcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BmcConfig")
            .field("address", &self.address)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// One lab machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Hostname, IP address or SSH config alias
    pub address: String,

    /// SSH user (default: from ~/.ssh/config, then config.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Primary private key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_identity_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmc: Option<BmcConfig>,
}

/// Where and as whom to SSH, after applying all defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub hostname: String,
    pub port: u16,
    pub user: String,
    pub key_paths: KeyPaths,
}

impl NodeConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            user: None,
            port: None,
            identity_file: None,
            fallback_identity_file: None,
            groups: Vec::new(),
            description: None,
            bmc: None,
        }
    }

    /// Builder pattern: set user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder pattern: set identity file
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Builder pattern: add group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Builder pattern: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder pattern: set BMC
    pub fn with_bmc(
        mut self,
        address: Option<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.bmc = Some(BmcConfig {
            address,
            user: user.into(),
            password: password.into(),
        });
        self
    }

    /// Merge node entry, SSH config and global config; node entry wins
    pub fn connection_settings(&self, config: &Config, ssh: &SshConfigMatch) -> ConnectionSettings {
        let identity = self
            .identity_file
            .as_deref()
            .or(ssh.identity_file.as_deref())
            .or(config.ssh_key_path.as_deref());
        let fallback = self
            .fallback_identity_file
            .as_deref()
            .or(config.ssh_fallback_key_path.as_deref());

        ConnectionSettings {
            hostname: ssh
                .host_name
                .clone()
                .unwrap_or_else(|| self.address.clone()),
            port: self.port.or(ssh.port).unwrap_or(config.ssh_port),
            user: self
                .user
                .clone()
                .or_else(|| ssh.user.clone())
                .unwrap_or_else(|| config.ssh_user.clone()),
            key_paths: KeyPaths::with_overrides(identity, fallback),
        }
    }
}

/// Root structure for nodes.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodesFile {
    /// Schema version for future migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Node name to entry, kept sorted so index selectors are stable
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
}

fn default_version() -> u32 {
    1
}

impl NodesFile {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, node: NodeConfig) {
        self.nodes.insert(name.into(), node);
    }

    pub fn remove_node(&mut self, name: &str) -> Option<NodeConfig> {
        self.nodes.remove(name)
    }

    pub fn get_node(&self, name: &str) -> Option<&NodeConfig> {
        self.nodes.get(name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Names in sorted order
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    /// Names of nodes tagged with `group`
    pub fn nodes_in_group(&self, group: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.groups.iter().any(|g| g == group))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
