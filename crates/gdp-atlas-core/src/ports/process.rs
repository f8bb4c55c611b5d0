// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Duration;

/// One bounded subprocess invocation: argv, optional standard input, and a
/// wall-clock budget after which the child is killed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl ProcessRequest {
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit status, `-1` when the child was terminated by a signal.
    pub status: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessResult {
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }

    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProcessError {
    NotFound(String),
    TimedOut { program: String, timeout: Duration },
    Io(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(program) => write!(f, "program `{program}` is not installed"),
            Self::TimedOut { program, timeout } => write!(
                f,
                "command `{program}` timed out after {}ms",
                timeout.as_millis()
            ),
            Self::Io(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ProcessError {}

pub trait ProcessPort: Send + Sync {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessResult, ProcessError>;
}
