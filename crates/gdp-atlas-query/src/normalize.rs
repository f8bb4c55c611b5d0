// SPDX-License-Identifier: Apache-2.0

//! Turns raw backend text into a [`TabularResult`].

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::events::{EventSink, QueryEvent};
use crate::query_error::QueryError;
use crate::tabular::{Cell, Column, ColumnType, TabularResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeError(String);

impl NormalizeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "result normalization failed: {}", self.0)
    }
}
impl std::error::Error for NormalizeError {}

/// Parses comma-separated text whose first line is a header. Empty input is
/// an empty table, not an error.
///
/// The final line terminator is optional. In a one-column result a blank
/// line is a NULL, which is how the sqlite3 shell prints it, so any blank
/// line left after that terminator is a row.
pub fn normalize_csv(raw: &str) -> Result<TabularResult, NormalizeError> {
    let text = raw
        .strip_suffix("\r\n")
        .or_else(|| raw.strip_suffix('\n'))
        .unwrap_or(raw);
    if text.trim().is_empty() {
        return Ok(TabularResult::empty());
    }
    let single_column = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes())
        .headers()
        .map_err(|e| NormalizeError::new(e.to_string()))?
        .len()
        == 1;
    let text = if single_column {
        Cow::Owned(quote_blank_lines(text))
    } else {
        Cow::Borrowed(text)
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| NormalizeError::new(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let names = dedupe_names(headers);

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for record in reader.records() {
        let record = record.map_err(|e| NormalizeError::new(e.to_string()))?;
        if record.len() != names.len() {
            return Err(NormalizeError::new(format!(
                "row has {} fields, header has {}",
                record.len(),
                names.len()
            )));
        }
        for (slot, field) in raw_columns.iter_mut().zip(record.iter()) {
            slot.push(field.to_string());
        }
    }

    let columns = names
        .into_iter()
        .zip(raw_columns)
        .map(|(name, cells)| infer_text_column(name, cells))
        .collect();
    TabularResult::from_columns(columns)
}

/// Gives every blank line outside a quoted field an explicit empty field,
/// since the csv reader skips blank lines entirely.
fn quote_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_quotes = false;
    let mut line_start = true;
    for ch in text.chars() {
        match ch {
            '\r' | '\n' if line_start && !in_quotes => {
                out.push_str("\"\"");
                line_start = ch == '\n';
            }
            '\n' if !in_quotes => line_start = true,
            '"' => {
                in_quotes = !in_quotes;
                line_start = false;
            }
            '\r' if !in_quotes => {}
            _ => line_start = false,
        }
        out.push(ch);
    }
    if line_start {
        out.push_str("\"\"");
    }
    out
}

/// Parses an array of JSON objects as emitted by `.mode json`.
pub fn normalize_json_records(raw: &str) -> Result<TabularResult, NormalizeError> {
    if raw.trim().is_empty() {
        return Ok(TabularResult::empty());
    }
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(raw).map_err(|e| NormalizeError::new(e.to_string()))?;

    let mut names: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells = rows
                .iter()
                .map(|row| row.get(&name).map_or(Cell::Null, json_cell))
                .collect();
            unify_column(name, cells)
        })
        .collect();
    TabularResult::from_columns(columns)
}

/// Repeated header names get a `.N` suffix so every column stays addressable.
fn dedupe_names(headers: Vec<String>) -> Vec<String> {
    let mut taken: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for name in headers {
        let mut candidate = name.clone();
        let mut n = 1;
        while taken.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn parse_integer(field: &str) -> Option<i64> {
    field.parse::<i64>().ok()
}

fn parse_real(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn infer_text_column(name: String, fields: Vec<String>) -> Column {
    let present = || fields.iter().filter(|f| !f.is_empty());
    let column_type = if present().next().is_none() {
        ColumnType::Real
    } else if present().all(|f| parse_integer(f).is_some()) {
        ColumnType::Integer
    } else if present().all(|f| parse_real(f).is_some()) {
        ColumnType::Real
    } else {
        ColumnType::Text
    };
    let values = fields
        .into_iter()
        .map(|field| {
            if field.is_empty() {
                return Cell::Null;
            }
            match column_type {
                ColumnType::Integer => parse_integer(&field).map_or(Cell::Null, Cell::Integer),
                ColumnType::Real => parse_real(&field).map_or(Cell::Null, Cell::Real),
                ColumnType::Text => Cell::Text(field),
            }
        })
        .collect();
    Column::new(name, column_type, values)
}

fn json_cell(value: &serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => Cell::Null,
        serde_json::Value::Bool(b) => Cell::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Cell::Integer)
            .or_else(|| n.as_f64().map(Cell::Real))
            .unwrap_or(Cell::Null),
        serde_json::Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

fn unify_column(name: String, cells: Vec<Cell>) -> Column {
    let present = || cells.iter().filter(|c| !c.is_null());
    let column_type = if present().next().is_none() {
        ColumnType::Real
    } else if present().all(|c| matches!(c, Cell::Integer(_))) {
        ColumnType::Integer
    } else if present().all(|c| matches!(c, Cell::Integer(_) | Cell::Real(_))) {
        ColumnType::Real
    } else {
        ColumnType::Text
    };
    let values = cells
        .into_iter()
        .map(|cell| match (column_type, cell) {
            (_, Cell::Null) => Cell::Null,
            (ColumnType::Real, Cell::Integer(v)) => Cell::Real(v as f64),
            (ColumnType::Text, cell @ (Cell::Integer(_) | Cell::Real(_))) => {
                Cell::Text(cell.render())
            }
            (_, cell) => cell,
        })
        .collect();
    Column::new(name, column_type, values)
}

/// Normalizer that never fails: malformed input becomes an empty table and a
/// single error event.
#[derive(Clone)]
pub struct Normalizer {
    sink: Arc<dyn EventSink>,
}

impl Normalizer {
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn to_table_or_empty(&self, raw: &str) -> TabularResult {
        match normalize_csv(raw) {
            Ok(table) => {
                self.sink.emit(QueryEvent::NormalizeCompleted {
                    rows: table.row_count(),
                    columns: table.column_count(),
                });
                table
            }
            Err(err) => {
                self.sink.emit(QueryEvent::NormalizeFailed {
                    message: err.to_string(),
                });
                TabularResult::empty()
            }
        }
    }
}

/// Collapses a typed outcome into the legacy "empty on any failure" shape.
/// The failure itself has already been reported by the executor.
pub trait TabularOutcomeExt {
    fn or_empty(self) -> TabularResult;
}

impl TabularOutcomeExt for Result<TabularResult, QueryError> {
    fn or_empty(self) -> TabularResult {
        self.unwrap_or_default()
    }
}
