//! Resilient remote host over SSH
//!
//! A `RemoteHost` owns at most one session to its target. Its lifecycle:
//!
//! ```text
//! Disconnected --ssh_connect--> Connecting --ok--> Connected
//!                                   ^  |                |
//!                                   +--+ transport      | session error during run
//!                                        error, sleep   v
//!                               Connecting <------- Disconnected
//! ```
//!
//! Transport errors while running a command are never returned: the
//! session is rebuilt with the same username and the command is re-run
//! until it completes. Only authentication failures (after trying the
//! fallback key) and an exhausted bounded connect policy reach the caller.
//!
//! All waits here are blocking and cannot be cancelled. With the default
//! unbounded policy, a node that never comes back keeps the caller waiting
//! forever; tests should inject a bounded, zero-delay `RetryPolicy`.

use std::thread;
use std::time::Duration;

use tracing::Level;

use super::credentials::{CredentialSet, KeyPaths};
use super::error::{ConnectError, HostError, SessionError};
use super::probe::{LivenessProbe, PingProbe};
use super::result::CommandResult;
use super::session::{Connector, Session, Ssh2Connector, SshTarget};
use super::{Host, log_line};
use crate::retry::RetryPolicy;

/// Connection state of a `RemoteHost`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Tunables for connecting to a remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    /// Policy for transport-level connect failures (default: forever, every 10s)
    pub connect_retry: RetryPolicy,
    /// Pause between liveness probes while waiting for the node (default: none)
    pub probe_interval: Duration,
    /// Key files read by `ssh_connect`
    pub key_paths: KeyPaths,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            connect_retry: RetryPolicy::unbounded(Duration::from_secs(10)),
            probe_interval: Duration::ZERO,
            key_paths: KeyPaths::default(),
        }
    }
}

/// SSH-reachable machine
pub struct RemoteHost<C: Connector = Ssh2Connector, P: LivenessProbe = PingProbe> {
    target: SshTarget,
    connector: C,
    probe: P,
    options: RemoteOptions,
    state: SessionState,
    credentials: Option<CredentialSet>,
    username: Option<String>,
    session: Option<C::Session>,
    reconnects: u32,
}

impl RemoteHost {
    /// Remote host on port 22 using libssh2 and ICMP probing
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::with_parts(
            SshTarget::new(hostname),
            Ssh2Connector::default(),
            PingProbe::default(),
            RemoteOptions::default(),
        )
    }
}

impl<C: Connector, P: LivenessProbe> RemoteHost<C, P> {
    /// Remote host with explicit transport, probe and options
    pub fn with_parts(target: SshTarget, connector: C, probe: P, options: RemoteOptions) -> Self {
        Self {
            target,
            connector,
            probe,
            options,
            state: SessionState::Disconnected,
            credentials: None,
            username: None,
            session: None,
            reconnects: 0,
        }
    }

    /// Builder pattern: replace options
    pub fn with_options(mut self, options: RemoteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.target.hostname
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Username of the current or last session
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// How many times a dropped session was rebuilt inside `run`
    pub fn reconnect_count(&self) -> u32 {
        self.reconnects
    }

    /// Single bounded liveness probe
    pub fn ping(&self) -> bool {
        self.probe.is_alive(&self.target.hostname)
    }

    /// Block until the target answers a liveness probe; no timeout
    pub fn wait_ping(&self) {
        while !self.ping() {
            if !self.options.probe_interval.is_zero() {
                thread::sleep(self.options.probe_interval);
            }
        }
    }

    /// Load keys, wait for the node to answer, then connect
    pub fn ssh_connect(&mut self, username: &str) -> Result<(), HostError> {
        let credentials = self.options.key_paths.load()?;
        self.connect_with_credentials(username, credentials)
    }

    /// Same as `ssh_connect` with keys already in memory
    pub fn connect_with_credentials(
        &mut self,
        username: &str,
        credentials: CredentialSet,
    ) -> Result<(), HostError> {
        self.credentials = Some(credentials);
        tracing::info!("waiting for '{}' to respond to ping", self.target.hostname);
        self.wait_ping();
        tracing::info!(
            "{} responded to ping, trying to connect",
            self.target.hostname
        );
        self.connect_looped(username)
    }

    /// Authenticate-and-connect loop
    ///
    /// Each call starts from the primary key. An authentication rejection
    /// switches to the fallback key once; a second rejection, or one with no
    /// fallback, is fatal. Transport errors sleep per `connect_retry` and try
    /// again.
    pub fn connect_looped(&mut self, username: &str) -> Result<(), HostError> {
        let credentials = match &self.credentials {
            Some(credentials) => credentials.clone(),
            None => {
                let loaded = self.options.key_paths.load()?;
                self.credentials = Some(loaded.clone());
                loaded
            }
        };

        self.username = Some(username.to_string());
        self.state = SessionState::Connecting;

        let mut current = &credentials.primary;
        let mut fallback_tried = false;
        let mut failures = 0u32;

        loop {
            match self.connector.connect(&self.target, username, current) {
                Ok(session) => {
                    self.session = Some(session);
                    self.state = SessionState::Connected;
                    tracing::info!("connected to {}", self.target.hostname);
                    return Ok(());
                }
                Err(ConnectError::Auth(reason)) => {
                    if !fallback_tried {
                        if let Some(fallback) = &credentials.fallback {
                            tracing::info!(
                                "{} rejected {} key, retrying with {}",
                                self.target.hostname,
                                current.kind,
                                fallback.kind
                            );
                            current = fallback;
                            fallback_tried = true;
                            continue;
                        }
                    }
                    self.state = SessionState::Disconnected;
                    return Err(HostError::AuthFailed {
                        target: self.target.hostname.clone(),
                        username: username.to_string(),
                        reason,
                    });
                }
                Err(ConnectError::Transport(reason)) => {
                    failures += 1;
                    let policy = self.options.connect_retry;
                    if !policy.allows_retry(failures) {
                        self.state = SessionState::Disconnected;
                        return Err(HostError::ConnectExhausted {
                            target: self.target.hostname.clone(),
                            attempts: failures,
                            last_error: reason,
                        });
                    }
                    let delay = policy.delay_for(failures);
                    tracing::info!(
                        "connecting to {} failed ({}), retrying in {:?}",
                        self.target.hostname,
                        reason,
                        delay
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
            }
        }
    }

    /// Release the session; later `run` calls fail with `NotConnected`
    pub fn close(&mut self) {
        self.drop_session();
        self.username = None;
    }

    fn drop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.state = SessionState::Disconnected;
    }

    fn execute(
        &mut self,
        command: &str,
        stdin: Option<&[u8]>,
        level: Level,
    ) -> Result<CommandResult, HostError> {
        let username = self
            .username
            .clone()
            .ok_or_else(|| HostError::NotConnected(self.target.hostname.clone()))?;

        loop {
            log_line(level, &format!("running command {command}"));

            let hostname = &self.target.hostname;
            let outcome = match self.session.as_mut() {
                Some(session) => session.exec(command, stdin, &mut |line| {
                    log_line(level, &format!("{hostname}: {line}"))
                }),
                None => Err(SessionError::Closed),
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(e) => {
                    log_line(level, &e.to_string());
                    tracing::warn!(
                        "Connection to {} lost while running command {}, reconnecting...",
                        self.target.hostname,
                        command
                    );
                    self.drop_session();
                    self.reconnects += 1;
                    self.connect_looped(&username)?;
                }
            }
        }
    }
}

impl<C: Connector, P: LivenessProbe> Host for RemoteHost<C, P> {
    fn name(&self) -> &str {
        &self.target.hostname
    }

    fn run_logged(&mut self, command: &str, level: Level) -> Result<CommandResult, HostError> {
        self.execute(command, None, level)
    }

    fn read_file(&mut self, path: &str) -> Result<String, HostError> {
        let command = format!("cat {}", quote_path(path)?);
        let result = self.execute(&command, None, Level::DEBUG)?;
        Ok(result.ok_or_failed(&command)?.into_stdout())
    }

    fn write_file(&mut self, path: &str, contents: &str) -> Result<(), HostError> {
        let command = format!("cat > {}", quote_path(path)?);
        self.execute(&command, Some(contents.as_bytes()), Level::DEBUG)?
            .ok_or_failed(&command)?;
        Ok(())
    }
}

impl<C: Connector, P: LivenessProbe> Drop for RemoteHost<C, P> {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::debug!("Closing SSH session to {}", self.target.hostname);
            self.drop_session();
        }
    }
}

fn quote_path(path: &str) -> Result<String, HostError> {
    shlex::try_quote(path)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| HostError::InvalidPath(path.to_string()))
}
