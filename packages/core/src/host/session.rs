//! SSH transport seam
//!
//! `Connector` opens authenticated sessions and `Session` runs commands on
//! them. `RemoteHost` only talks to these traits; the production
//! implementation is backed by libssh2 through the `ssh2` crate.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ssh2::ErrorCode;

use super::credentials::Credential;
use super::error::{ConnectError, SessionError};
use super::result::CommandResult;

// libssh2 session error codes that mean "this key will never work"
const LIBSSH2_ERROR_FILE: i32 = -16;
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;
const LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED: i32 = -19;

/// Network address of an SSH target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub hostname: String,
    pub port: u16,
}

impl SshTarget {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: 22,
        }
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// An authenticated channel to one target
pub trait Session {
    /// Run `command`, feeding `stdin` if given, calling `on_line` for each
    /// stdout line as it arrives.
    ///
    /// Any error means the session is no longer usable.
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&[u8]>,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<CommandResult, SessionError>;

    /// Tear the session down
    fn close(&mut self);
}

/// Opens sessions
pub trait Connector {
    type Session: Session;

    /// One connect + authenticate attempt with a single credential
    fn connect(
        &self,
        target: &SshTarget,
        username: &str,
        credential: &Credential,
    ) -> Result<Self::Session, ConnectError>;
}

/// `Connector` backed by libssh2
#[derive(Debug, Clone)]
pub struct Ssh2Connector {
    /// TCP connect timeout per attempt
    pub connect_timeout: Duration,
}

impl Default for Ssh2Connector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl Ssh2Connector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for Ssh2Connector {
    type Session = Ssh2Session;

    fn connect(
        &self,
        target: &SshTarget,
        username: &str,
        credential: &Credential,
    ) -> Result<Ssh2Session, ConnectError> {
        let addr = (target.hostname.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| ConnectError::Transport(format!("resolve {}: {e}", target.hostname)))?
            .next()
            .ok_or_else(|| {
                ConnectError::Transport(format!("no address for {}", target.hostname))
            })?;

        let tcp = TcpStream::connect_timeout(&addr, self.connect_timeout)
            .map_err(|e| ConnectError::Transport(format!("connect {addr}: {e}")))?;

        let mut session =
            ssh2::Session::new().map_err(|e| ConnectError::Transport(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ConnectError::Transport(format!("handshake: {e}")))?;

        session
            .userauth_pubkey_memory(username, None, &credential.material, None)
            .map_err(classify_auth_error)?;

        if !session.authenticated() {
            return Err(ConnectError::Auth(format!(
                "{} key not accepted",
                credential.kind
            )));
        }

        Ok(Ssh2Session { session })
    }
}

fn classify_auth_error(err: ssh2::Error) -> ConnectError {
    match err.code() {
        ErrorCode::Session(
            LIBSSH2_ERROR_FILE
            | LIBSSH2_ERROR_AUTHENTICATION_FAILED
            | LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED,
        ) => ConnectError::Auth(err.message().to_string()),
        _ => ConnectError::Transport(err.to_string()),
    }
}

/// Live libssh2 session
pub struct Ssh2Session {
    session: ssh2::Session,
}

impl Session for Ssh2Session {
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&[u8]>,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<CommandResult, SessionError> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        if let Some(input) = stdin {
            channel.write_all(input)?;
            channel.send_eof()?;
        }

        let mut stdout = Vec::new();
        {
            let mut reader = BufReader::new(&mut channel);
            let mut line = Vec::new();
            loop {
                line.clear();
                if reader.read_until(b'\n', &mut line)? == 0 {
                    break;
                }
                on_line(String::from_utf8_lossy(&line).trim_end());
                stdout.extend_from_slice(&line);
            }
        }

        let mut stderr = Vec::new();
        channel.stderr().read_to_end(&mut stderr)?;

        channel.wait_close()?;
        let exit_code = channel.exit_status()?;

        Ok(CommandResult::new(
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr),
            exit_code,
        ))
    }

    fn close(&mut self) {
        if let Err(e) = self.session.disconnect(None, "closing", None) {
            // Session may already be dead
            tracing::debug!("SSH disconnect result: {}", e);
        }
    }
}
