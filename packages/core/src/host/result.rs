//! Command execution result

use super::error::HostError;

/// Captured output of a finished command
///
/// A nonzero exit code is a normal outcome; callers inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl CommandResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a nonzero exit into `HostError::CommandFailed`
    pub fn ok_or_failed(self, command: &str) -> Result<Self, HostError> {
        if self.success() {
            Ok(self)
        } else {
            Err(HostError::CommandFailed {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }

    /// Consume the result, keeping only stdout
    pub fn into_stdout(self) -> String {
        self.stdout
    }
}
