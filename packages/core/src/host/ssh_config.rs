//! ~/.ssh/config lookups
//!
//! Used when adding nodes so an alias the operator already set up for
//! `ssh` resolves to the same address, user, port and key here.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ssh2_config::{ParseRule, SshConfig};

use super::error::HostError;

/// Settings the SSH config provides for one alias
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshConfigMatch {
    /// Real address behind the alias (HostName)
    pub host_name: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    /// First IdentityFile entry
    pub identity_file: Option<PathBuf>,
}

impl SshConfigMatch {
    pub fn has_settings(&self) -> bool {
        self.host_name.is_some()
            || self.user.is_some()
            || self.port.is_some()
            || self.identity_file.is_some()
    }

    /// Format found settings for display
    pub fn display_settings(&self) -> String {
        let mut parts = Vec::new();
        if let Some(host_name) = &self.host_name {
            parts.push(format!("HostName={host_name}"));
        }
        if let Some(user) = &self.user {
            parts.push(format!("User={user}"));
        }
        if let Some(port) = self.port {
            parts.push(format!("Port={port}"));
        }
        if let Some(key) = &self.identity_file {
            parts.push(format!("IdentityFile={}", key.display()));
        }
        parts.join(", ")
    }
}

/// ~/.ssh/config
pub fn get_ssh_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("config"))
}

/// Query the user's SSH config for `alias`; a missing file yields no settings
pub fn query_ssh_config(alias: &str) -> Result<SshConfigMatch, HostError> {
    match get_ssh_config_path() {
        Some(path) if path.exists() => query_ssh_config_file(&path, alias),
        _ => {
            tracing::debug!("No SSH config file found");
            Ok(SshConfigMatch::default())
        }
    }
}

/// Query a specific SSH config file for `alias`
pub fn query_ssh_config_file(path: &Path, alias: &str) -> Result<SshConfigMatch, HostError> {
    let file = File::open(path).map_err(|e| {
        HostError::SshConfigRead(format!("Failed to open {}: {}", path.display(), e))
    })?;
    query_reader(&mut BufReader::new(file), alias)
}

fn query_reader(reader: &mut impl BufRead, alias: &str) -> Result<SshConfigMatch, HostError> {
    // Lenient: operators' configs carry options ssh2-config doesn't model
    let config = SshConfig::default()
        .parse(reader, ParseRule::ALLOW_UNKNOWN_FIELDS)
        .map_err(|e| HostError::SshConfigRead(format!("Failed to parse SSH config: {e}")))?;

    let params = config.query(alias);
    Ok(SshConfigMatch {
        host_name: params.host_name,
        user: params.user,
        port: params.port,
        identity_file: params
            .identity_file
            .and_then(|files| files.into_iter().next()),
    })
}
