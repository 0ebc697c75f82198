//! Local command execution
//!
//! Runs commands on the control machine. The command string is split with
//! shell-words rules and executed directly, without a shell.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use tracing::Level;

use super::error::HostError;
use super::result::CommandResult;
use super::{Host, log_line};

/// The machine this process runs on
#[derive(Debug, Clone, Default)]
pub struct LocalHost {
    env: HashMap<String, String>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add an environment variable for every spawned command
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    fn execute(&self, command: &str, level: Level) -> Result<CommandResult, HostError> {
        let args = shlex::split(command)
            .ok_or_else(|| HostError::InvalidCommand(format!("unbalanced quotes in '{command}'")))?;
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| HostError::InvalidCommand("empty command".to_string()))?;

        log_line(level, &format!("running command {command}"));

        let mut child = Command::new(program)
            .args(rest)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HostError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // Both pipes were requested above, so a missing one means the
        // platform broke the spawn contract. StreamUnavailable is fatal: no
        // layer retries it, it goes straight back to the caller.
        let mut stdout = child
            .stdout
            .take()
            .ok_or(HostError::StreamUnavailable("stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or(HostError::StreamUnavailable("stderr"))?;

        // Drain stderr on its own thread so a chatty stream can't fill its pipe
        let stderr_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).map(|_| buf)
        });

        let mut out = Vec::new();
        let read_result = stdout.read_to_end(&mut out);
        let err = stderr_reader
            .join()
            .map_err(|_| HostError::StreamUnavailable("stderr"))?;

        let io_error = |source| HostError::Spawn {
            command: command.to_string(),
            source,
        };
        read_result.map_err(io_error)?;
        let err = err.map_err(io_error)?;
        let status = child.wait().map_err(io_error)?;

        Ok(CommandResult::new(
            String::from_utf8_lossy(&out),
            String::from_utf8_lossy(&err),
            exit_code(status),
        ))
    }
}

/// Exit code as reported by the OS; signals map to their negated number
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

impl Host for LocalHost {
    fn name(&self) -> &str {
        "localhost"
    }

    fn run_logged(&mut self, command: &str, level: Level) -> Result<CommandResult, HostError> {
        self.execute(command, level)
    }

    fn read_file(&mut self, path: &str) -> Result<String, HostError> {
        fs::read_to_string(path).map_err(|source| HostError::Io {
            path: Path::new(path).to_path_buf(),
            source,
        })
    }

    fn write_file(&mut self, path: &str, contents: &str) -> Result<(), HostError> {
        fs::write(path, contents).map_err(|source| HostError::Io {
            path: Path::new(path).to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_captures_stdout_and_exit_code() {
        let mut host = LocalHost::new();
        let result = host.run("echo hello").unwrap();
        assert_eq!(result.stdout(), "hello\n");
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn run_reports_nonzero_exit_verbatim() {
        let mut host = LocalHost::new();
        let result = host.run("sh -c 'echo oops >&2; exit 3'").unwrap();
        assert_eq!(result.exit_code(), 3);
        assert_eq!(result.stderr(), "oops\n");
        assert!(result.stdout().is_empty());
    }

    #[test]
    fn run_drains_both_streams() {
        let mut host = LocalHost::new();
        let result = host
            .run("sh -c 'echo out; echo err >&2; echo more'")
            .unwrap();
        assert_eq!(result.stdout(), "out\nmore\n");
        assert_eq!(result.stderr(), "err\n");
    }

    #[test]
    fn run_passes_environment_overrides() {
        let mut host = LocalHost::new().with_env("LABHOST_TEST_VAR", "42");
        let result = host.run("sh -c 'echo $LABHOST_TEST_VAR'").unwrap();
        assert_eq!(result.stdout().trim(), "42");
    }

    #[test]
    fn run_rejects_empty_and_unbalanced_commands() {
        let mut host = LocalHost::new();
        assert!(matches!(host.run(""), Err(HostError::InvalidCommand(_))));
        assert!(matches!(
            host.run("echo 'unterminated"),
            Err(HostError::InvalidCommand(_))
        ));
    }

    #[test]
    fn run_missing_binary_is_spawn_error() {
        let mut host = LocalHost::new();
        let err = host.run("labhost-definitely-not-a-binary").unwrap_err();
        assert!(matches!(err, HostError::Spawn { .. }));
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motd");
        let path = path.to_str().unwrap();

        let mut host = LocalHost::new();
        host.write_file(path, "welcome to the lab\n").unwrap();
        assert_eq!(host.read_file(path).unwrap(), "welcome to the lab\n");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");

        let mut host = LocalHost::new();
        let err = host.read_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, HostError::Io { .. }));
    }
}
