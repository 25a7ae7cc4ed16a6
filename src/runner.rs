//! External process execution.
//!
//! The scanner never talks to a shell. Commands are built as a program
//! plus argument list and handed to a [`CommandRunner`], which lets tests
//! substitute canned tool output for a real nmap binary.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, ScanError};

/// A program invocation, without shell interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ScanCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command line as it would be typed, for logs and the report's audit trail.
    ///
    /// Words are quoted so the line splits back into the same argv with shlex.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|word| shlex::try_quote(word).map_or_else(|_| word.clone(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for ScanCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Exit status and combined stdout/stderr of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub output: String,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// nmap reports benign non-zero codes; only a failure with no output is unusable.
    pub fn is_unusable(&self) -> bool {
        !self.is_success() && self.output.trim().is_empty()
    }
}

/// Runs external commands on behalf of the scanner.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Returns true if `program` can be executed.
    fn is_available(&self, program: &str) -> bool;

    /// Runs `command` to completion and returns its exit code and merged output.
    ///
    /// A non-zero exit is not an error at this level; callers decide
    /// whether the output is usable.
    async fn run(&self, command: &ScanCommand) -> Result<CommandOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills any process that runs longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// A timeout of zero seconds means no timeout.
    pub fn with_timeout_secs(seconds: u64) -> Self {
        if seconds == 0 {
            Self::new()
        } else {
            Self::with_timeout(Duration::from_secs(seconds))
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        find_executable(program).is_some()
    }

    async fn run(&self, command: &ScanCommand) -> Result<CommandOutput> {
        let line = command.command_line();
        debug!(command = %line, "spawning process");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ScanError::ToolUnavailable(command.program.clone())
                } else {
                    ScanError::Io {
                        command: line.clone(),
                        source,
                    }
                }
            })?;

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(command = %line, seconds = limit.as_secs(), "process timed out");
                    return Err(ScanError::Timeout {
                        command: line,
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| ScanError::Io {
            command: line.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        debug!(command = %line, exit_code = ?output.status.code(), bytes = text.len(), "process finished");

        Ok(CommandOutput {
            exit_code: output.status.code(),
            output: text,
        })
    }
}

/// Resolves `program` against `PATH`, or checks it directly if it contains a path separator.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable_file(candidate).then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        executable_names(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| is_executable_file(path))
    })
}

fn executable_names(program: &str) -> Vec<String> {
    if cfg!(target_os = "windows") && Path::new(program).extension().is_none() {
        vec![format!("{}.exe", program), program.to_string()]
    } else {
        vec![program.to_string()]
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
