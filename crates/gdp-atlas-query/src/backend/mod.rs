// SPDX-License-Identifier: Apache-2.0

mod cli;
mod native;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::descriptor::QueryDescriptor;
use crate::executor::ExecError;

pub use cli::{param_literal, render_script, CliBackend};
pub use native::{serialize_rows, NativeBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Cli,
    Native,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Native => "native",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way of running a [`QueryDescriptor`] against the store and returning
/// the serialized output text.
pub trait QueryBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn execute(&self, query: &QueryDescriptor) -> Result<String, ExecError>;
}
