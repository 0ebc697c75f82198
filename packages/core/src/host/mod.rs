//! Host execution module
//!
//! Provides the capability every provisioning step is written against:
//! - `Host` trait: `run`, `read_file`, `write_file`
//! - `LocalHost` for the control machine
//! - `RemoteHost` for SSH targets, reconnecting transparently on transport loss
//! - `RemoteHostWithContainer` for running commands inside a managed container
//! - `LabHost` enum for dispatching over the variants without trait objects

mod container;
mod credentials;
mod error;
mod local;
mod os_release;
mod probe;
mod remote;
mod result;
mod session;
mod ssh_config;

use std::collections::HashMap;

use tracing::Level;

// Public exports
pub use container::{ContainerSpec, RemoteHostWithContainer};
pub use credentials::{Credential, CredentialSet, KeyKind, KeyPaths};
pub use error::{ConnectError, HostError, SessionError};
pub use local::LocalHost;
pub use os_release::parse_os_release;
pub use probe::{LivenessProbe, PingProbe};
pub use remote::{RemoteHost, RemoteOptions, SessionState};
pub use result::CommandResult;
pub use session::{Connector, Session, Ssh2Connector, Ssh2Session, SshTarget};
pub use ssh_config::{
    SshConfigMatch, get_ssh_config_path, query_ssh_config, query_ssh_config_file,
};

/// Something commands can be executed against
///
/// `run` never fails because a command exited nonzero; that is reported in
/// the `CommandResult`. Errors are reserved for the channel itself: spawn
/// failures locally, authentication failures or an exhausted bounded
/// connect policy remotely. Transport drops on a `RemoteHost` are retried
/// inside `run` and never surface here.
pub trait Host {
    /// Identity used in logs and errors
    fn name(&self) -> &str;

    /// Run a command, echoing its output lines at `level`
    fn run_logged(&mut self, command: &str, level: Level) -> Result<CommandResult, HostError>;

    /// Read a whole file on the target
    fn read_file(&mut self, path: &str) -> Result<String, HostError>;

    /// Create or replace a file on the target
    fn write_file(&mut self, path: &str, contents: &str) -> Result<(), HostError>;

    /// Run a command, echoing output at `INFO`
    fn run(&mut self, command: &str) -> Result<CommandResult, HostError> {
        self.run_logged(command, Level::INFO)
    }

    /// Run a command and treat a nonzero exit as an error
    fn run_or_die(&mut self, command: &str) -> Result<CommandResult, HostError> {
        self.run(command)?.ok_or_failed(command)
    }

    /// Key/value pairs from `/etc/os-release`
    fn os_release(&mut self) -> Result<HashMap<String, String>, HostError> {
        let result = self.run_logged("cat /etc/os-release", Level::DEBUG)?;
        Ok(parse_os_release(result.stdout()))
    }

    /// Whether a libvirt domain is running on the target
    fn vm_is_running(&mut self, name: &str) -> Result<bool, HostError> {
        let result = self.run(&format!("virsh dominfo {name}"))?;
        if !result.success() {
            return Ok(false);
        }
        Ok(result
            .stdout()
            .lines()
            .any(|line| line.starts_with("State:") && line.contains("running")))
    }

    /// Whether a network interface exists on the target
    fn port_exists(&mut self, port_name: &str) -> Result<bool, HostError> {
        Ok(self.run(&format!("ip link show {port_name}"))?.success())
    }
}

/// Copy the wall-clock time of `src` onto `dst` with `sudo date -s`
pub fn sync_time<S, D>(src: &mut S, dst: &mut D) -> Result<CommandResult, HostError>
where
    S: Host + ?Sized,
    D: Host + ?Sized,
{
    let date = src.run("date")?.into_stdout();
    dst.run(&format!("sudo date -s \"{}\"", date.trim()))
}

/// Any execution target
pub enum LabHost {
    Local(LocalHost),
    Remote(RemoteHost),
    Container(RemoteHostWithContainer),
}

impl LabHost {
    /// Release the remote session, if any
    pub fn close(&mut self) {
        match self {
            LabHost::Local(_) => {}
            LabHost::Remote(host) => host.close(),
            LabHost::Container(host) => host.remote_mut().close(),
        }
    }
}

impl Host for LabHost {
    fn name(&self) -> &str {
        match self {
            LabHost::Local(host) => host.name(),
            LabHost::Remote(host) => host.name(),
            LabHost::Container(host) => host.name(),
        }
    }

    fn run_logged(&mut self, command: &str, level: Level) -> Result<CommandResult, HostError> {
        match self {
            LabHost::Local(host) => host.run_logged(command, level),
            LabHost::Remote(host) => host.run_logged(command, level),
            LabHost::Container(host) => host.run_logged(command, level),
        }
    }

    fn read_file(&mut self, path: &str) -> Result<String, HostError> {
        match self {
            LabHost::Local(host) => host.read_file(path),
            LabHost::Remote(host) => host.read_file(path),
            LabHost::Container(host) => host.read_file(path),
        }
    }

    fn write_file(&mut self, path: &str, contents: &str) -> Result<(), HostError> {
        match self {
            LabHost::Local(host) => host.write_file(path, contents),
            LabHost::Remote(host) => host.write_file(path, contents),
            LabHost::Container(host) => host.write_file(path, contents),
        }
    }
}

/// Emit a log line at a level chosen at runtime
pub(crate) fn log_line(level: Level, message: &str) {
    match level {
        Level::ERROR => tracing::error!("{message}"),
        Level::WARN => tracing::warn!("{message}"),
        Level::INFO => tracing::info!("{message}"),
        Level::DEBUG => tracing::debug!("{message}"),
        Level::TRACE => tracing::trace!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Host double that answers from a fixed table
    struct ScriptedHost {
        answers: HashMap<String, CommandResult>,
        commands: Vec<String>,
    }

    impl ScriptedHost {
        fn new(answers: &[(&str, CommandResult)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(cmd, result)| (cmd.to_string(), result.clone()))
                    .collect(),
                commands: Vec::new(),
            }
        }
    }

    impl Host for ScriptedHost {
        fn name(&self) -> &str {
            "scripted"
        }

        fn run_logged(&mut self, command: &str, _level: Level) -> Result<CommandResult, HostError> {
            self.commands.push(command.to_string());
            Ok(self
                .answers
                .get(command)
                .cloned()
                .unwrap_or_else(|| CommandResult::new("", "not found", 127)))
        }

        fn read_file(&mut self, _path: &str) -> Result<String, HostError> {
            Ok(String::new())
        }

        fn write_file(&mut self, _path: &str, _contents: &str) -> Result<(), HostError> {
            Ok(())
        }
    }

    #[test]
    fn vm_is_running_checks_state_line() {
        let running = CommandResult::new("Id: 3\nName: vm1\nState:          running\n", "", 0);
        let stopped = CommandResult::new("Id: -\nName: vm2\nState:          shut off\n", "", 0);
        let mut host = ScriptedHost::new(&[
            ("virsh dominfo vm1", running),
            ("virsh dominfo vm2", stopped),
        ]);

        assert!(host.vm_is_running("vm1").unwrap());
        assert!(!host.vm_is_running("vm2").unwrap());
        assert!(!host.vm_is_running("vm3").unwrap());
    }

    #[test]
    fn port_exists_follows_ip_link_exit_status() {
        let mut host = ScriptedHost::new(&[(
            "ip link show ens1f0",
            CommandResult::new("4: ens1f0: <BROADCAST,MULTICAST,UP> mtu 1500\n", "", 0),
        )]);

        assert!(host.port_exists("ens1f0").unwrap());
        assert!(!host.port_exists("ens9").unwrap());
        assert_eq!(host.commands, vec!["ip link show ens1f0", "ip link show ens9"]);
    }

    #[test]
    fn run_or_die_surfaces_nonzero_exit() {
        let mut host = ScriptedHost::new(&[("true", CommandResult::new("", "", 0))]);
        assert!(host.run_or_die("true").is_ok());
        assert!(matches!(
            host.run_or_die("false"),
            Err(HostError::CommandFailed { exit_code: 127, .. })
        ));
    }

    #[test]
    fn os_release_is_parsed() {
        let mut host = ScriptedHost::new(&[(
            "cat /etc/os-release",
            CommandResult::new("ID=\"rhel\"\nVERSION_ID='9.4'\n", "", 0),
        )]);
        let release = host.os_release().unwrap();
        assert_eq!(release.get("ID").map(String::as_str), Some("rhel"));
        assert_eq!(release.get("VERSION_ID").map(String::as_str), Some("9.4"));
    }

    #[test]
    fn sync_time_copies_date() {
        let mut src = ScriptedHost::new(&[(
            "date",
            CommandResult::new("Mon Oct 19 10:00:00 UTC 2026\n", "", 0),
        )]);
        let mut dst = ScriptedHost::new(&[]);

        sync_time(&mut src, &mut dst).unwrap();
        assert_eq!(
            dst.commands,
            vec!["sudo date -s \"Mon Oct 19 10:00:00 UTC 2026\"".to_string()]
        );
    }
}
