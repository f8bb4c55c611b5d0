// SPDX-License-Identifier: Apache-2.0

use gdp_atlas_query::{Cell, Column, ColumnType, TabularResult};
use serde_json::Value;

use crate::commands::DisplayFormat;
use crate::OutputMode;

pub(crate) fn emit_ok(output_mode: OutputMode, payload: Value) -> Result<(), String> {
    if output_mode.json {
        println!(
            "{}",
            serde_json::to_string(&payload).map_err(|e| e.to_string())?
        );
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())?
        );
    }
    Ok(())
}

/// `--json` turns the default display into JSON records; an explicit
/// `--format` always wins.
pub(crate) fn resolve_format(requested: Option<DisplayFormat>, output_mode: OutputMode) -> DisplayFormat {
    match requested {
        Some(format) => format,
        None if output_mode.json => DisplayFormat::Json,
        None => DisplayFormat::Table,
    }
}

pub(crate) fn emit_table(table: &TabularResult, format: DisplayFormat) -> Result<(), String> {
    let text = render(table, format)?;
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}

pub(crate) fn render(table: &TabularResult, format: DisplayFormat) -> Result<String, String> {
    match format {
        DisplayFormat::Table => Ok(render_aligned(table)),
        DisplayFormat::Csv => Ok(table
            .to_csv()
            .map_err(|e| e.to_string())?
            .trim_end_matches(&['\r', '\n'][..])
            .to_string()),
        DisplayFormat::Json => {
            serde_json::to_string(&table.to_json_records()).map_err(|e| e.to_string())
        }
    }
}

fn display_cell(cell: &Cell) -> String {
    if cell.is_null() {
        "NULL".to_string()
    } else {
        cell.render()
    }
}

/// Space-padded columns under a dashed rule; numeric columns align right.
pub(crate) fn render_aligned(table: &TabularResult) -> String {
    if table.column_count() == 0 {
        return "(no rows)".to_string();
    }
    let columns = table.columns();
    let rendered: Vec<Vec<String>> = columns
        .iter()
        .map(|c| c.values.iter().map(display_cell).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .zip(&rendered)
        .map(|(column, cells)| {
            cells
                .iter()
                .map(|s| s.chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = |text: &str, width: usize, right: bool| {
        let fill = " ".repeat(width.saturating_sub(text.chars().count()));
        if right {
            format!("{fill}{text}")
        } else {
            format!("{text}{fill}")
        }
    };

    let numeric = |column: &Column| {
        matches!(column.column_type, ColumnType::Integer | ColumnType::Real)
    };

    let mut lines = Vec::with_capacity(table.row_count() + 2);
    lines.push(
        columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(&c.name, *w, numeric(c)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string(),
    );
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in 0..table.row_count() {
        let line = columns
            .iter()
            .zip(&rendered)
            .zip(&widths)
            .map(|((column, cells), w)| pad(&cells[row], *w, numeric(column)))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdp_atlas_query::normalize_csv;

    #[test]
    fn aligned_output_pads_and_right_aligns_numbers() {
        let table = normalize_csv("country_code,gdp\nUS,21000.0\nDE,\n").expect("normalize");
        let text = render_aligned(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "country_code      gdp");
        assert_eq!(lines[1], "------------  -------");
        assert_eq!(lines[2], "US            21000.0");
        assert_eq!(lines[3], "DE               NULL");
    }

    #[test]
    fn empty_result_renders_placeholder() {
        let table = TabularResult::empty();
        assert_eq!(render(&table, DisplayFormat::Table).expect("table"), "(no rows)");
        assert_eq!(render(&table, DisplayFormat::Json).expect("json"), "[]");
    }

    #[test]
    fn json_flag_only_changes_the_default() {
        let json = OutputMode { json: true };
        let human = OutputMode { json: false };
        assert_eq!(resolve_format(None, json), DisplayFormat::Json);
        assert_eq!(resolve_format(None, human), DisplayFormat::Table);
        assert_eq!(
            resolve_format(Some(DisplayFormat::Csv), json),
            DisplayFormat::Csv
        );
    }
}
