use std::fmt;
use std::time::Duration;

/// Structured error for external command invocations (`git`, `supabase`,
/// `docker`, `psql`).
#[derive(Debug)]
pub enum ExecError {
    /// Command did not exit within its timeout.
    Timeout { command: String, timeout: Duration },

    /// Command ran but returned non-zero exit.
    CommandFailed {
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    /// Binary couldn't be executed (not in PATH, permission denied).
    ExecFailed {
        command: String,
        source: std::io::Error,
    },
}

impl ExecError {
    pub fn timeout(cmd: impl Into<String>, dur: Duration) -> Self {
        ExecError::Timeout {
            command: cmd.into(),
            timeout: dur,
        }
    }

    /// Build a command-failed error from captured output.
    pub fn failed(cmd: impl Into<String>, output: &super::CommandOutput) -> Self {
        let stderr = if output.stderr.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            output.stderr.trim().to_string()
        };
        ExecError::CommandFailed {
            command: cmd.into(),
            stderr,
            exit_code: output.exit_code,
        }
    }

    pub fn exec_failed(cmd: impl Into<String>, err: std::io::Error) -> Self {
        ExecError::ExecFailed {
            command: cmd.into(),
            source: err,
        }
    }

    /// True when the binary itself could not be found on PATH.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExecError::ExecFailed { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    pub fn command(&self) -> &str {
        match self {
            ExecError::Timeout { command, .. }
            | ExecError::CommandFailed { command, .. }
            | ExecError::ExecFailed { command, .. } => command,
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Timeout { command, timeout } => {
                write!(
                    f,
                    "Timed out running '{}' (exceeded {} seconds)",
                    command,
                    timeout.as_secs()
                )
            }
            ExecError::CommandFailed {
                command,
                stderr,
                exit_code,
            } => {
                if let Some(code) = exit_code {
                    write!(f, "'{}' failed (exit code {}): {}", command, code, stderr)
                } else {
                    write!(f, "'{}' failed: {}", command, stderr)
                }
            }
            ExecError::ExecFailed { command, source } => {
                write!(f, "Failed to execute '{}': {}", command, source)
            }
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::ExecFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
