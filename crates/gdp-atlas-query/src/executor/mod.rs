// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use gdp_atlas_core::ProcessPort;

use crate::backend::{BackendKind, CliBackend, NativeBackend, QueryBackend};
use crate::config::{BackendPreference, BridgeConfig};
use crate::descriptor::{OutputFormat, QueryDescriptor};
use crate::events::{EventSink, QueryEvent};
use crate::normalize::normalize_csv;
use crate::probe::probe_cli;
use crate::query_error::{QueryError, QueryErrorCode};
use crate::tabular::TabularResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The backend itself cannot run: missing binary or unopenable store.
    Unavailable(String),
    Timeout(String),
    /// The shell ran and exited non-zero.
    Failed { status: i32, stderr: String },
    Driver(String),
    Io(String),
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { status, stderr } => {
                write!(f, "sqlite3 exited with status {status}: {stderr}")
            }
            Self::Unavailable(msg) | Self::Timeout(msg) | Self::Driver(msg) | Self::Io(msg) => {
                f.write_str(msg)
            }
        }
    }
}

impl std::error::Error for ExecError {}

/// Runs descriptors against the store. The backend is chosen once at
/// construction; the only later change is a one-way switch from the shell to
/// the native driver when the shell binary disappears.
pub struct QueryExecutor {
    cli: Option<Box<dyn QueryBackend>>,
    native: Box<dyn QueryBackend>,
    cli_enabled: AtomicBool,
    sink: Arc<dyn EventSink>,
}

impl QueryExecutor {
    /// Validates config, checks the store opens, then probes the shell when
    /// the preference allows it. Failing to open the store is fatal.
    pub fn connect(
        config: &BridgeConfig,
        process: Arc<dyn ProcessPort>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, QueryError> {
        config.validate()?;
        let native = NativeBackend::new(&config.db_path, config.query_timeout);
        native.check().map_err(|e| {
            QueryError::new(QueryErrorCode::Unavailable, e.to_string())
        })?;

        let cli = match config.backend {
            BackendPreference::Native => None,
            BackendPreference::Auto | BackendPreference::Cli => {
                let report = probe_cli(
                    process.as_ref(),
                    &config.sqlite_program,
                    config.probe_timeout,
                    sink.as_ref(),
                );
                if report.available {
                    Some(CliBackend::new(
                        &config.sqlite_program,
                        &config.db_path,
                        config.query_timeout,
                        Arc::clone(&process),
                    ))
                } else if config.backend == BackendPreference::Cli {
                    return Err(QueryError::new(
                        QueryErrorCode::Unavailable,
                        format!("cli backend requested but unusable: {}", report.detail),
                    ));
                } else {
                    None
                }
            }
        };

        let reason = match (config.backend, cli.is_some()) {
            (BackendPreference::Native, _) => "configured",
            (_, true) => "probe succeeded",
            (_, false) => "probe failed",
        };
        let executor = Self::with_backends(
            cli.map(|b| Box::new(b) as Box<dyn QueryBackend>),
            Box::new(native),
            sink,
        );
        executor.sink.emit(QueryEvent::BackendSelected {
            backend: executor.active_backend(),
            reason: reason.to_string(),
        });
        Ok(executor)
    }

    /// Assembles an executor from ready-made backends without probing.
    #[must_use]
    pub fn with_backends(
        cli: Option<Box<dyn QueryBackend>>,
        native: Box<dyn QueryBackend>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let cli_enabled = AtomicBool::new(cli.is_some());
        Self {
            cli,
            native,
            cli_enabled,
            sink,
        }
    }

    #[must_use]
    pub fn active_backend(&self) -> BackendKind {
        if self.cli.is_some() && self.cli_enabled.load(Ordering::Acquire) {
            BackendKind::Cli
        } else {
            self.native.kind()
        }
    }

    #[must_use]
    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    /// Runs the descriptor and returns the backend's output text. Zero rows
    /// is `Ok` with empty text. Each failure is reported once to the sink.
    pub fn execute(&self, query: &QueryDescriptor) -> Result<String, ExecError> {
        if let Some(cli) = self.cli.as_deref() {
            if self.cli_enabled.load(Ordering::Acquire) {
                match self.run(cli, query) {
                    Err(ExecError::Unavailable(reason)) => {
                        if self.cli_enabled.swap(false, Ordering::AcqRel) {
                            self.sink.emit(QueryEvent::BackendFallback {
                                from: BackendKind::Cli,
                                to: self.native.kind(),
                                reason,
                            });
                        }
                    }
                    other => return other,
                }
            }
        }
        self.run(self.native.as_ref(), query)
    }

    /// Runs the descriptor in CSV mode and normalizes the output.
    pub fn query_table(&self, query: &QueryDescriptor) -> Result<TabularResult, QueryError> {
        let raw = if query.format() == OutputFormat::Csv {
            self.execute(query)?
        } else {
            self.execute(&query.with_format(OutputFormat::Csv))?
        };
        match normalize_csv(&raw) {
            Ok(table) => {
                self.sink.emit(QueryEvent::NormalizeCompleted {
                    rows: table.row_count(),
                    columns: table.column_count(),
                });
                Ok(table)
            }
            Err(err) => {
                self.sink.emit(QueryEvent::NormalizeFailed {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    fn run(&self, backend: &dyn QueryBackend, query: &QueryDescriptor) -> Result<String, ExecError> {
        let kind = backend.kind();
        self.sink.emit(QueryEvent::QueryStarted {
            backend: kind,
            format: query.format(),
            sql: query.preview(),
            params: query.params().len(),
        });
        let started = Instant::now();
        let outcome = backend.execute(query);
        match &outcome {
            Ok(text) => self.sink.emit(QueryEvent::QueryCompleted {
                backend: kind,
                format: query.format(),
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                output_bytes: text.len(),
            }),
            Err(err) => {
                let code = QueryError::from(err.clone()).code;
                self.sink.emit(QueryEvent::QueryFailed {
                    backend: kind,
                    format: query.format(),
                    code,
                    message: err.to_string(),
                });
            }
        }
        outcome
    }
}
