//! Remote host with a long-lived helper container
//!
//! Some tooling only ships as a container image. The container runs
//! privileged in the host's pid and network namespaces with /dev mounted,
//! so commands inside it see the node's hardware.

use tracing::Level;

use super::Host;
use super::error::HostError;
use super::probe::{LivenessProbe, PingProbe};
use super::remote::RemoteHost;
use super::result::CommandResult;
use super::session::{Connector, Ssh2Connector};

/// Which container to run and what to call it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
}

impl Default for ContainerSpec {
    fn default() -> Self {
        Self {
            name: "bf".to_string(),
            image: "quay.io/bnemeth/bf".to_string(),
        }
    }
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }

    /// (Re)create the container, pulling the image every time
    pub fn setup_command(&self) -> String {
        format!(
            "sudo podman run --pull always --replace --pid host --network host --user 0 \
             --name {} -dit --privileged -v /dev:/dev {}",
            self.name, self.image
        )
    }

    pub fn exec_command(&self, command: &str, interactive: bool) -> String {
        let flags = if interactive { " -it" } else { "" };
        format!("sudo podman exec{flags} {} {command}", self.name)
    }
}

/// `RemoteHost` that can also run commands inside a container on the node
///
/// `run` and file access go to the node itself; `run_in_container` goes
/// through the container.
pub struct RemoteHostWithContainer<C: Connector = Ssh2Connector, P: LivenessProbe = PingProbe> {
    remote: RemoteHost<C, P>,
    spec: ContainerSpec,
}

impl<C: Connector, P: LivenessProbe> RemoteHostWithContainer<C, P> {
    pub fn new(remote: RemoteHost<C, P>, spec: ContainerSpec) -> Self {
        Self { remote, spec }
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    pub fn remote(&self) -> &RemoteHost<C, P> {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut RemoteHost<C, P> {
        &mut self.remote
    }

    /// Make sure the container is up, then run `command` in it
    ///
    /// A failed setup is returned as-is and nothing is executed.
    pub fn run_in_container(
        &mut self,
        command: &str,
        interactive: bool,
    ) -> Result<CommandResult, HostError> {
        let setup = self.remote.run(&self.spec.setup_command())?;
        if !setup.success() {
            tracing::warn!(
                "Failed to start container {} on {}",
                self.spec.name,
                self.remote.hostname()
            );
            return Ok(setup);
        }
        self.remote
            .run(&self.spec.exec_command(command, interactive))
    }
}

impl<C: Connector, P: LivenessProbe> Host for RemoteHostWithContainer<C, P> {
    fn name(&self) -> &str {
        self.remote.name()
    }

    fn run_logged(&mut self, command: &str, level: Level) -> Result<CommandResult, HostError> {
        self.remote.run_logged(command, level)
    }

    fn read_file(&mut self, path: &str) -> Result<String, HostError> {
        self.remote.read_file(path)
    }

    fn write_file(&mut self, path: &str, contents: &str) -> Result<(), HostError> {
        self.remote.write_file(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::host::error::{ConnectError, SessionError};
    use crate::host::{Credential, CredentialSet, KeyKind, RemoteOptions, Session, SshTarget};

    #[derive(Default)]
    struct Log {
        commands: Vec<String>,
        fail_setup: bool,
    }

    struct Recorder(Rc<RefCell<Log>>);

    impl Connector for Recorder {
        type Session = Recorder;

        fn connect(
            &self,
            _target: &SshTarget,
            _username: &str,
            _credential: &Credential,
        ) -> Result<Recorder, ConnectError> {
            Ok(Recorder(Rc::clone(&self.0)))
        }
    }

    impl Session for Recorder {
        fn exec(
            &mut self,
            command: &str,
            _stdin: Option<&[u8]>,
            _on_line: &mut dyn FnMut(&str),
        ) -> Result<CommandResult, SessionError> {
            let mut log = self.0.borrow_mut();
            log.commands.push(command.to_string());
            let failed = log.fail_setup && command.contains("podman run");
            Ok(CommandResult::new("", "", if failed { 125 } else { 0 }))
        }

        fn close(&mut self) {}
    }

    struct Up;

    impl LivenessProbe for Up {
        fn is_alive(&self, _address: &str) -> bool {
            true
        }
    }

    fn connected(log: &Rc<RefCell<Log>>) -> RemoteHostWithContainer<Recorder, Up> {
        let mut remote = RemoteHost::with_parts(
            SshTarget::new("dpu-host"),
            Recorder(Rc::clone(log)),
            Up,
            RemoteOptions::default(),
        );
        remote
            .connect_with_credentials(
                "core",
                CredentialSet::new(Credential::new(KeyKind::Rsa, "key")),
            )
            .unwrap();
        RemoteHostWithContainer::new(remote, ContainerSpec::default())
    }

    #[test]
    fn setup_command_runs_privileged_host_namespaces() {
        let cmd = ContainerSpec::default().setup_command();
        assert_eq!(
            cmd,
            "sudo podman run --pull always --replace --pid host --network host --user 0 \
             --name bf -dit --privileged -v /dev:/dev quay.io/bnemeth/bf"
        );
    }

    #[test]
    fn runs_setup_then_exec() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut host = connected(&log);

        let result = host.run_in_container("bfb-info", false).unwrap();

        assert!(result.success());
        let commands = &log.borrow().commands;
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("sudo podman run"));
        assert_eq!(commands[1], "sudo podman exec bf bfb-info");
    }

    #[test]
    fn interactive_exec_allocates_tty() {
        let spec = ContainerSpec::new("tools", "registry.lab/tools:latest");
        assert_eq!(
            spec.exec_command("bash", true),
            "sudo podman exec -it tools bash"
        );
    }

    #[test]
    fn failed_setup_skips_exec() {
        let log = Rc::new(RefCell::new(Log {
            fail_setup: true,
            ..Log::default()
        }));
        let mut host = connected(&log);

        let result = host.run_in_container("bfb-info", false).unwrap();

        assert_eq!(result.exit_code(), 125);
        assert_eq!(log.borrow().commands.len(), 1);
    }

    #[test]
    fn plain_run_goes_to_node() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut host = connected(&log);

        host.run("uname -r").unwrap();
        assert_eq!(log.borrow().commands, vec!["uname -r".to_string()]);
    }
}
