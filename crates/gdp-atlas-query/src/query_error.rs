// SPDX-License-Identifier: Apache-2.0

use gdp_atlas_core::ExitCode;
use gdp_atlas_model::ValidationError;

use crate::executor::ExecError;
use crate::normalize::NormalizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryErrorCode {
    Validation,
    Execution,
    Timeout,
    Unavailable,
    Parse,
    Io,
}

impl QueryErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Execution => "execution",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::Parse => "parse",
            Self::Io => "io",
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        match self {
            Self::Validation => ExitCode::Validation,
            Self::Unavailable => ExitCode::DependencyFailure,
            Self::Execution | Self::Timeout | Self::Parse | Self::Io => ExitCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub code: QueryErrorCode,
    pub message: String,
}

impl QueryError {
    #[must_use]
    pub fn new(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::Validation, message)
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}
impl std::error::Error for QueryError {}

impl From<ValidationError> for QueryError {
    fn from(value: ValidationError) -> Self {
        Self::new(QueryErrorCode::Validation, value.0)
    }
}

impl From<NormalizeError> for QueryError {
    fn from(value: NormalizeError) -> Self {
        Self::new(QueryErrorCode::Parse, value.to_string())
    }
}

impl From<ExecError> for QueryError {
    fn from(value: ExecError) -> Self {
        match value {
            ExecError::Unavailable(msg) => Self::new(QueryErrorCode::Unavailable, msg),
            ExecError::Timeout(msg) => Self::new(QueryErrorCode::Timeout, msg),
            ExecError::Failed { status, stderr } => Self::new(
                QueryErrorCode::Execution,
                format!("sqlite3 exited with status {status}: {stderr}"),
            ),
            ExecError::Driver(msg) | ExecError::Io(msg) => {
                Self::new(QueryErrorCode::Execution, msg)
            }
        }
    }
}
