// SPDX-License-Identifier: Apache-2.0

//! Column-oriented result table produced by the normalizer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::normalize::NormalizeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            Self::Null | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Real(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => Some(*v as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// CSV field text: empty for null, shortest round-trip form for reals.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(v) => v.to_string(),
            Self::Real(v) => format!("{v:?}"),
            Self::Text(v) => v.clone(),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
        }
    }

    fn admits(self, cell: &Cell) -> bool {
        matches!(
            (self, cell),
            (_, Cell::Null)
                | (Self::Integer, Cell::Integer(_))
                | (Self::Real, Cell::Real(_))
                | (Self::Text, Cell::Text(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Cell>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularResult {
    columns: Vec<Column>,
    row_count: usize,
}

impl TabularResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a table, checking that names are unique, every column has
    /// the same length and every cell agrees with its column type.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, NormalizeError> {
        let row_count = columns.first().map_or(0, |c| c.values.len());
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(NormalizeError::new(format!(
                    "duplicate column name `{}`",
                    column.name
                )));
            }
            if column.values.len() != row_count {
                return Err(NormalizeError::new(format!(
                    "column `{}` has {} values, expected {row_count}",
                    column.name,
                    column.values.len()
                )));
            }
            if let Some(bad) = column
                .values
                .iter()
                .find(|cell| !column.column_type.admits(cell))
            {
                return Err(NormalizeError::new(format!(
                    "column `{}` of type {} holds {bad:?}",
                    column.name,
                    column.column_type.as_str()
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no rows, whether or not a header was present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        self.column(column).and_then(|c| c.values.get(row))
    }

    #[must_use]
    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.row_count).then_some(Record { table: self, row })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.row_count).map(move |row| Record { table: self, row })
    }

    /// Rows as JSON objects keyed by column name, in column order.
    #[must_use]
    pub fn to_json_records(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.records()
                .map(|record| {
                    let object = record
                        .iter()
                        .map(|(name, cell)| (name.to_string(), cell_to_json(cell)))
                        .collect::<serde_json::Map<_, _>>();
                    serde_json::Value::Object(object)
                })
                .collect(),
        )
    }

    pub fn to_csv(&self) -> Result<String, NormalizeError> {
        if self.columns.is_empty() {
            return Ok(String::new());
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| NormalizeError::new(e.to_string()))?;
        for record in self.records() {
            writer
                .write_record(record.iter().map(|(_, cell)| cell.render()))
                .map_err(|e| NormalizeError::new(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| NormalizeError::new(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| NormalizeError::new(e.to_string()))
    }
}

fn cell_to_json(cell: &Cell) -> serde_json::Value {
    match cell {
        Cell::Null => serde_json::Value::Null,
        Cell::Integer(v) => serde_json::Value::from(*v),
        Cell::Real(v) => serde_json::Number::from_f64(*v)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Cell::Text(v) => serde_json::Value::String(v.clone()),
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a TabularResult,
    row: usize,
}

impl<'a> Record<'a> {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.row
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.table.cell(self.row, column)
    }

    #[must_use]
    pub fn f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_f64)
    }

    #[must_use]
    pub fn i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Cell::as_i64)
    }

    #[must_use]
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Cell::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> + 'a {
        let row = self.row;
        self.table
            .columns
            .iter()
            .map(move |c| (c.name.as_str(), &c.values[row]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TabularResult {
        TabularResult::from_columns(vec![
            Column::new(
                "country_code",
                ColumnType::Text,
                vec![Cell::Text("US".into()), Cell::Text("DE".into())],
            ),
            Column::new(
                "gdp",
                ColumnType::Real,
                vec![Cell::Real(21000.0), Cell::Null],
            ),
        ])
        .expect("table")
    }

    #[test]
    fn rejects_ragged_and_mistyped_columns() {
        let ragged = TabularResult::from_columns(vec![
            Column::new("a", ColumnType::Integer, vec![Cell::Integer(1)]),
            Column::new("b", ColumnType::Integer, vec![]),
        ]);
        assert!(ragged.is_err());
        let mistyped = TabularResult::from_columns(vec![Column::new(
            "a",
            ColumnType::Integer,
            vec![Cell::Text("x".into())],
        )]);
        assert!(mistyped.is_err());
        let dup = TabularResult::from_columns(vec![
            Column::new("a", ColumnType::Real, vec![]),
            Column::new("a", ColumnType::Real, vec![]),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn records_expose_cells_by_name() {
        let table = sample();
        let rows: Vec<_> = table.records().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("country_code"), Some("US"));
        assert_eq!(rows[0].f64("gdp"), Some(21000.0));
        assert_eq!(rows[1].f64("gdp"), None);
        assert!(table.record(2).is_none());
    }

    #[test]
    fn csv_rendering_keeps_nulls_empty_and_reals_decimal() {
        let csv = sample().to_csv().expect("csv");
        assert_eq!(csv, "country_code,gdp\nUS,21000.0\nDE,\n");
    }

    #[test]
    fn json_records_preserve_column_order() {
        let json = sample().to_json_records();
        assert_eq!(
            json.to_string(),
            r#"[{"country_code":"US","gdp":21000.0},{"country_code":"DE","gdp":null}]"#
        );
    }

    #[test]
    fn empty_table_has_no_rows_or_columns() {
        let table = TabularResult::empty();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.to_csv().expect("csv"), "");
    }
}
