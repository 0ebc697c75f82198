//! Host-specific error types
//!
//! Errors that can occur while executing commands on local or remote hosts.
//! A nonzero exit status is not an error; it comes back inside
//! `CommandResult`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during host operations
#[derive(Error, Debug)]
pub enum HostError {
    /// The command string could not be split into arguments
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Failed to spawn a local process
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The platform did not provide stdout/stderr pipes
    ///
    /// Fatal: never retried by `LocalHost` or `RemoteHost`.
    #[error("Local process {0} stream unavailable; the environment is misconfigured")]
    StreamUnavailable(&'static str),

    /// Local filesystem access failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path cannot be quoted for the remote shell
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Neither the primary nor the fallback key could be found
    #[error("No SSH key found (looked for {} and {})", .primary.display(), .fallback.display())]
    NoCredentials { primary: PathBuf, fallback: PathBuf },

    /// A key file exists but could not be read
    #[error("Failed to read SSH key {}: {source}", .path.display())]
    CredentialRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every available credential was rejected by the target
    #[error("SSH authentication failed for {username}@{target}: {reason}")]
    AuthFailed {
        target: String,
        username: String,
        reason: String,
    },

    /// A bounded connect policy ran out of attempts
    #[error("Could not connect to {target} after {attempts} attempts: {last_error}")]
    ConnectExhausted {
        target: String,
        attempts: u32,
        last_error: String,
    },

    /// `run` was called before `ssh_connect` or after `close`
    #[error("Not connected to {0}")]
    NotConnected(String),

    /// `run_or_die` saw a nonzero exit status
    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Failed to read ~/.ssh/config
    #[error("Failed to read SSH config: {0}")]
    SshConfigRead(String),
}

/// Outcome of a single connect attempt, as reported by a `Connector`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The target rejected the credential; retrying the same key is pointless
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Network-level failure (refused, unreachable, timeout, handshake)
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure while using an established session
///
/// Any of these means the session is gone and must be rebuilt.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_names_target_and_user() {
        let err = HostError::AuthFailed {
            target: "node1.lab".to_string(),
            username: "core".to_string(),
            reason: "publickey denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("core@node1.lab"));
        assert!(msg.contains("publickey denied"));
    }

    #[test]
    fn command_failed_includes_exit_code() {
        let err = HostError::CommandFailed {
            command: "false".to_string(),
            exit_code: 1,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit code 1"));
    }
}
