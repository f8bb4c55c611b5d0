// SPDX-License-Identifier: Apache-2.0

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BackendKind, QueryBackend};
use crate::descriptor::{OutputFormat, QueryDescriptor};
use crate::executor::ExecError;

/// Runs queries in-process through rusqlite. Each call opens its own
/// read-only connection, so calls never share state.
#[derive(Debug, Clone)]
pub struct NativeBackend {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl NativeBackend {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout,
        }
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn open(&self) -> Result<Connection, ExecError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            ExecError::Unavailable(format!(
                "cannot open store {}: {e}",
                self.db_path.display()
            ))
        })?;
        conn.busy_timeout(self.busy_timeout).map_err(driver)?;
        conn.execute_batch("PRAGMA query_only=ON;")
            .map_err(driver)?;
        register_functions(&conn)?;
        Ok(conn)
    }

    /// Opens the store and touches the schema. A file that is missing or is
    /// not a database fails here rather than on the first query.
    pub fn check(&self) -> Result<(), ExecError> {
        let conn = self.open()?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| {
            ExecError::Unavailable(format!(
                "store {} is not readable: {e}",
                self.db_path.display()
            ))
        })?;
        Ok(())
    }
}

impl QueryBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn execute(&self, query: &QueryDescriptor) -> Result<String, ExecError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(query.sql()).map_err(driver)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt
            .query(params_from_iter(query.params().iter()))
            .map_err(driver)?;
        let mut data: Vec<Vec<Value>> = Vec::new();
        while let Some(row) = rows.next().map_err(driver)? {
            let mut record = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                record.push(row.get::<_, Value>(i).map_err(driver)?);
            }
            data.push(record);
        }
        serialize_rows(query.format(), &columns, &data)
    }
}

fn driver(err: rusqlite::Error) -> ExecError {
    ExecError::Driver(err.to_string())
}

/// `sqrt` is not compiled into every SQLite build; the outlier query needs it.
fn register_functions(conn: &Connection) -> Result<(), ExecError> {
    conn.create_scalar_function(
        "sqrt",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<f64>>(0)?;
            Ok(value.filter(|v| *v >= 0.0).map(f64::sqrt))
        },
    )
    .map_err(driver)
}

/// Serializes driver rows into the text shape of the requested output mode.
/// Zero rows render as empty text in every mode.
pub fn serialize_rows(
    format: OutputFormat,
    columns: &[String],
    rows: &[Vec<Value>],
) -> Result<String, ExecError> {
    if rows.is_empty() || columns.is_empty() {
        return Ok(String::new());
    }
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer
                .write_record(columns)
                .map_err(|e| ExecError::Io(e.to_string()))?;
            for row in rows {
                writer
                    .write_record(row.iter().map(render_value))
                    .map_err(|e| ExecError::Io(e.to_string()))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| ExecError::Io(e.to_string()))?;
            let text = String::from_utf8(bytes).map_err(|e| ExecError::Io(e.to_string()))?;
            Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
        }
        OutputFormat::Json => {
            let records: Vec<serde_json::Value> = rows
                .iter()
                .map(|row| {
                    serde_json::Value::Object(
                        columns
                            .iter()
                            .cloned()
                            .zip(row.iter().map(json_value))
                            .collect(),
                    )
                })
                .collect();
            serde_json::to_string(&records).map_err(|e| ExecError::Io(e.to_string()))
        }
        OutputFormat::Table => Ok(render_tab_lines(columns, rows)),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => format!("{v:?}"),
        Value::Text(v) => v.clone(),
        Value::Blob(bytes) => bytes.iter().fold(String::new(), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        }),
    }
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(v) => serde_json::Value::from(*v),
        Value::Real(v) => serde_json::Number::from_f64(*v)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(_) | Value::Blob(_) => serde_json::Value::String(render_value(value)),
    }
}

fn render_tab_lines(columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.join("\t"));
    for row in rows {
        lines.push(row.iter().map(render_value).collect::<Vec<_>>().join("\t"));
    }
    lines.join("\n")
}
