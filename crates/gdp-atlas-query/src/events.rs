// SPDX-License-Identifier: Apache-2.0

//! Structured diagnostics emitted by the bridge. Components receive an
//! [`EventSink`] at construction instead of writing to a global logger.

use std::sync::{Mutex, PoisonError};

use crate::backend::BackendKind;
use crate::descriptor::OutputFormat;
use crate::query_error::QueryErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    BackendProbed {
        program: String,
        available: bool,
        detail: String,
    },
    BackendSelected {
        backend: BackendKind,
        reason: String,
    },
    BackendFallback {
        from: BackendKind,
        to: BackendKind,
        reason: String,
    },
    QueryStarted {
        backend: BackendKind,
        format: OutputFormat,
        sql: String,
        params: usize,
    },
    QueryCompleted {
        backend: BackendKind,
        format: OutputFormat,
        elapsed_ms: u64,
        output_bytes: usize,
    },
    QueryFailed {
        backend: BackendKind,
        format: OutputFormat,
        code: QueryErrorCode,
        message: String,
    },
    NormalizeCompleted {
        rows: usize,
        columns: usize,
    },
    NormalizeFailed {
        message: String,
    },
}

impl QueryEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BackendProbed { .. } => "backend_probed",
            Self::BackendSelected { .. } => "backend_selected",
            Self::BackendFallback { .. } => "backend_fallback",
            Self::QueryStarted { .. } => "query_started",
            Self::QueryCompleted { .. } => "query_completed",
            Self::QueryFailed { .. } => "query_failed",
            Self::NormalizeCompleted { .. } => "normalize_completed",
            Self::NormalizeFailed { .. } => "normalize_failed",
        }
    }

    #[must_use]
    pub const fn severity(&self) -> EventSeverity {
        match self {
            Self::BackendProbed { available: true, .. } | Self::BackendSelected { .. } => {
                EventSeverity::Info
            }
            Self::BackendProbed { available: false, .. } | Self::BackendFallback { .. } => {
                EventSeverity::Warn
            }
            Self::QueryStarted { .. }
            | Self::QueryCompleted { .. }
            | Self::NormalizeCompleted { .. } => EventSeverity::Debug,
            Self::QueryFailed { .. } | Self::NormalizeFailed { .. } => EventSeverity::Error,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity(), EventSeverity::Error)
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: QueryEvent);
}

/// Forwards events to `tracing` under the `gdp_atlas_query` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: QueryEvent) {
        let name = event.name();
        match event {
            QueryEvent::BackendProbed {
                program,
                available: true,
                detail,
            } => tracing::info!(target: "gdp_atlas_query", event = name, program = %program, version = %detail, "sqlite3 cli is available"),
            QueryEvent::BackendProbed {
                program,
                available: false,
                detail,
            } => tracing::warn!(target: "gdp_atlas_query", event = name, program = %program, reason = %detail, "sqlite3 cli is not usable"),
            QueryEvent::BackendSelected { backend, reason } => {
                tracing::info!(target: "gdp_atlas_query", event = name, backend = backend.as_str(), reason = %reason, "query backend selected");
            }
            QueryEvent::BackendFallback { from, to, reason } => {
                tracing::warn!(target: "gdp_atlas_query", event = name, from = from.as_str(), to = to.as_str(), reason = %reason, "query backend switched");
            }
            QueryEvent::QueryStarted {
                backend,
                format,
                sql,
                params,
            } => tracing::debug!(target: "gdp_atlas_query", event = name, backend = backend.as_str(), format = format.as_str(), sql = %sql, params, "executing query"),
            QueryEvent::QueryCompleted {
                backend,
                format,
                elapsed_ms,
                output_bytes,
            } => tracing::debug!(target: "gdp_atlas_query", event = name, backend = backend.as_str(), format = format.as_str(), elapsed_ms, output_bytes, "query completed"),
            QueryEvent::QueryFailed {
                backend,
                format,
                code,
                message,
            } => tracing::error!(target: "gdp_atlas_query", event = name, backend = backend.as_str(), format = format.as_str(), code = code.as_str(), error = %message, "query failed"),
            QueryEvent::NormalizeCompleted { rows, columns } => {
                tracing::debug!(target: "gdp_atlas_query", event = name, rows, columns, "result normalized");
            }
            QueryEvent::NormalizeFailed { message } => {
                tracing::error!(target: "gdp_atlas_query", event = name, error = %message, "result normalization failed");
            }
        }
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: QueryEvent) {}
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<QueryEvent>>,
}

impl RecordingEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<QueryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<QueryEvent> {
        self.events()
            .into_iter()
            .filter(QueryEvent::is_error)
            .collect()
    }

    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: QueryEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
