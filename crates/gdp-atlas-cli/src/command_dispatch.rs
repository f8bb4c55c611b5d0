// SPDX-License-Identifier: Apache-2.0

use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use gdp_atlas_core::SystemProcess;
use gdp_atlas_model::{Metric, Year};
use gdp_atlas_query::{
    probe_cli, BackendPreference, BridgeConfig, GdpQueries, OutputFormat, QueryDescriptor,
    QueryError, SortOrder, TracingEventSink,
};

use crate::command_output_adapters::{emit_ok, emit_table, resolve_format};
use crate::commands::Commands;
use crate::{CliError, OutputMode};

/// Global flags that take precedence over `GDP_ATLAS_*` variables.
pub(crate) struct StoreOverrides {
    pub(crate) db: Option<PathBuf>,
    pub(crate) backend: Option<BackendPreference>,
}

impl StoreOverrides {
    fn config(&self) -> Result<BridgeConfig, QueryError> {
        let mut cfg = BridgeConfig::from_env()?;
        if let Some(db) = &self.db {
            cfg.db_path.clone_from(db);
        }
        if let Some(backend) = self.backend {
            cfg.backend = backend;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn connect(&self) -> Result<GdpQueries, QueryError> {
        let cfg = self.config()?;
        GdpQueries::connect(&cfg, Arc::new(SystemProcess), Arc::new(TracingEventSink))
    }
}

const fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Probe => "probe",
        Commands::Tables => "tables",
        Commands::Schema { .. } => "schema",
        Commands::Explore { .. } => "explore",
        Commands::Summary => "summary",
        Commands::Query { .. } => "query",
        Commands::Top { .. } => "top",
        Commands::Export { .. } => "export",
    }
}

pub(crate) fn run_command(
    command: Commands,
    overrides: &StoreOverrides,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    tracing::debug!(command = command_name(&command), "dispatching command");
    match command {
        Commands::Probe => run_probe(overrides, output_mode),
        Commands::Tables => {
            let queries = overrides.connect()?;
            let tables = queries.list_tables()?;
            emit_ok(output_mode, json!({"command": "tables", "tables": tables}))
                .map_err(CliError::internal)
        }
        Commands::Schema { table } => {
            let queries = overrides.connect()?;
            let sql = queries
                .table_schema(&table)?
                .ok_or_else(|| QueryError::validation(format!("unknown table `{table}`")))?;
            if output_mode.json {
                emit_ok(
                    output_mode,
                    json!({"command": "schema", "table": table, "sql": sql}),
                )
                .map_err(CliError::internal)
            } else {
                println!("{sql}");
                Ok(())
            }
        }
        Commands::Explore { table, limit } => run_explore(overrides, &table, limit, output_mode),
        Commands::Summary => {
            let queries = overrides.connect()?;
            let stats = serde_json::to_value(queries.summary_statistics()?)
                .map_err(|e| CliError::internal(e.to_string()))?;
            emit_ok(
                output_mode,
                json!({
                    "command": "summary",
                    "backend": queries.executor().active_backend().as_str(),
                    "statistics": stats,
                }),
            )
            .map_err(CliError::internal)
        }
        Commands::Query { sql, format, raw } => {
            let queries = overrides.connect()?;
            let format = resolve_format(format, output_mode);
            if raw {
                let text = queries.custom_raw(&sql, format.backend_format())?;
                print!("{text}");
                if !text.is_empty() && !text.ends_with('\n') {
                    println!();
                }
                Ok(())
            } else {
                let table = queries.custom(&sql)?;
                emit_table(&table, format).map_err(CliError::internal)
            }
        }
        Commands::Top {
            metric,
            year,
            limit,
            ascending,
            format,
        } => {
            let metric = Metric::parse(&metric).map_err(QueryError::from)?;
            let year = Year::new(year).map_err(QueryError::from)?;
            let order = if ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            let queries = overrides.connect()?;
            let table = queries.top_countries_by_metric(metric, year, limit, order)?;
            emit_table(&table, resolve_format(format, output_mode)).map_err(CliError::internal)
        }
        Commands::Export { sql, out } => {
            if sql.trim().is_empty() {
                return Err(QueryError::validation("query text must not be empty").into());
            }
            let queries = overrides.connect()?;
            let rows = queries.export_to_csv(&QueryDescriptor::new(sql, OutputFormat::Csv), &out)?;
            emit_ok(
                output_mode,
                json!({"command": "export", "out": out, "rows": rows, "written": rows > 0}),
            )
            .map_err(CliError::internal)
        }
    }
}

/// Reports the shell probe without requiring the store to exist.
fn run_probe(overrides: &StoreOverrides, output_mode: OutputMode) -> Result<(), CliError> {
    let cfg = overrides.config()?;
    let report = probe_cli(
        &SystemProcess,
        &cfg.sqlite_program,
        cfg.probe_timeout,
        &TracingEventSink,
    );
    let selected = match (cfg.backend, report.available) {
        (BackendPreference::Native, _) | (BackendPreference::Auto, false) => Some("native"),
        (_, true) => Some("cli"),
        (BackendPreference::Cli, false) => None,
    };
    emit_ok(
        output_mode,
        json!({
            "command": "probe",
            "program": report.program,
            "available": report.available,
            "detail": report.detail,
            "preference": cfg.backend.as_str(),
            "selected": selected,
        }),
    )
    .map_err(CliError::internal)
}

fn run_explore(
    overrides: &StoreOverrides,
    table: &str,
    limit: usize,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let queries = overrides.connect()?;
    let total = queries.row_count(table)?;
    let sample = queries.sample_rows(table, limit)?;
    if output_mode.json {
        emit_ok(
            output_mode,
            json!({
                "command": "explore",
                "table": table,
                "row_count": total,
                "sample": sample.to_json_records(),
            }),
        )
        .map_err(CliError::internal)
    } else {
        println!("{table}: {total} rows");
        emit_table(&sample, resolve_format(None, output_mode)).map_err(CliError::internal)
    }
}
