// SPDX-License-Identifier: Apache-2.0

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Table,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Table => "table",
        }
    }

    /// Dot-commands that put the sqlite3 shell into this output mode.
    #[must_use]
    pub const fn mode_directive(self) -> &'static str {
        match self {
            Self::Csv => ".mode csv\n.headers on\n",
            Self::Json => ".mode json\n",
            Self::Table => ".mode table\n",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            other => Err(format!(
                "unknown output format `{other}`; expected csv, json or table"
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL text plus the values bound to its `?N` placeholders. Caller-supplied
/// data only ever travels in `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    sql: String,
    params: Vec<Value>,
    format: OutputFormat,
}

impl QueryDescriptor {
    #[must_use]
    pub fn new(sql: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            format,
        }
    }

    #[must_use]
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>, format: OutputFormat) -> Self {
        Self {
            sql: sql.into(),
            params,
            format,
        }
    }

    #[must_use]
    pub fn csv(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self::with_params(sql, params, OutputFormat::Csv)
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    #[must_use]
    pub fn with_format(&self, format: OutputFormat) -> Self {
        Self {
            sql: self.sql.clone(),
            params: self.params.clone(),
            format,
        }
    }

    /// Leading slice of the SQL used in log events.
    #[must_use]
    pub fn preview(&self) -> String {
        const PREVIEW_CHARS: usize = 100;
        let flat = self.sql.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= PREVIEW_CHARS {
            flat
        } else {
            let mut out: String = flat.chars().take(PREVIEW_CHARS).collect();
            out.push_str("...");
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        let q = QueryDescriptor::new("SELECT *\n   FROM data", OutputFormat::Csv);
        assert_eq!(q.preview(), "SELECT * FROM data");
        let long = QueryDescriptor::new("x".repeat(150), OutputFormat::Csv);
        assert_eq!(long.preview().len(), 103);
    }
}
