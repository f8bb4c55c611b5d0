// SPDX-License-Identifier: Apache-2.0

use rusqlite::types::Value;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gdp_atlas_core::{ProcessError, ProcessPort, ProcessRequest};

use super::{BackendKind, QueryBackend};
use crate::descriptor::{OutputFormat, QueryDescriptor};
use crate::executor::ExecError;

/// Runs queries through the external `sqlite3` shell, one process per call.
pub struct CliBackend {
    program: String,
    db_path: PathBuf,
    timeout: Duration,
    process: Arc<dyn ProcessPort>,
}

impl CliBackend {
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        db_path: impl Into<PathBuf>,
        timeout: Duration,
        process: Arc<dyn ProcessPort>,
    ) -> Self {
        Self {
            program: program.into(),
            db_path: db_path.into(),
            timeout,
            process,
        }
    }

    #[must_use]
    pub fn request(&self, query: &QueryDescriptor) -> ProcessRequest {
        ProcessRequest::new(&self.program, self.timeout)
            .arg("-readonly")
            .arg("-bail")
            .arg(self.db_path.to_string_lossy())
            .stdin(render_script(query))
    }
}

impl QueryBackend for CliBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cli
    }

    fn execute(&self, query: &QueryDescriptor) -> Result<String, ExecError> {
        match self.process.run(&self.request(query)) {
            Ok(out) if out.success() => Ok(shell_text(&out.stdout_lossy(), query.format())),
            Ok(out) => Err(ExecError::Failed {
                status: out.status,
                stderr: out.stderr_lossy().trim().to_string(),
            }),
            Err(ProcessError::NotFound(program)) => Err(ExecError::Unavailable(format!(
                "program `{program}` is not installed"
            ))),
            Err(err @ ProcessError::TimedOut { .. }) => Err(ExecError::Timeout(err.to_string())),
            Err(err) => Err(ExecError::Io(err.to_string())),
        }
    }
}

/// CSV keeps its record terminators: a NULL in a one-column result is a
/// blank line, and trimming would drop it at the end of the output. The
/// normalizer removes the final terminator.
fn shell_text(stdout: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Csv => stdout.trim_start_matches(&['\r', '\n'][..]).to_string(),
        OutputFormat::Json | OutputFormat::Table => stdout.trim().to_string(),
    }
}

/// Builds the stdin script: output mode, one `.parameter set` per bound
/// value, then the statement itself.
#[must_use]
pub fn render_script(query: &QueryDescriptor) -> String {
    let mut script = String::from(query.format().mode_directive());
    for (i, value) in query.params().iter().enumerate() {
        let _ = writeln!(script, ".parameter set ?{} {}", i + 1, param_literal(value));
    }
    let sql = query.sql().trim().trim_end_matches(';');
    script.push_str(sql);
    script.push_str(";\n");
    script
}

/// SQL expression for a bound value that contains no quote or whitespace, so
/// the shell's dot-command tokenizer passes it through untouched. Text is
/// spelled out with `char()` code points.
#[must_use]
pub fn param_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) if v.is_finite() => format!("{v:?}"),
        Value::Real(_) => "NULL".to_string(),
        Value::Text(text) => {
            if text.is_empty() {
                return "char()".to_string();
            }
            let codes = text
                .chars()
                .map(|c| u32::from(c).to_string())
                .collect::<Vec<_>>()
                .join(",");
            format!("char({codes})")
        }
        Value::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for b in bytes {
                let _ = write!(hex, "{b:02x}");
            }
            hex.push('\'');
            hex
        }
    }
}
