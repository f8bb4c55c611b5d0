// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Query execution and result normalization for the indicator store.
//!
//! A [`QueryDescriptor`] is run by the [`QueryExecutor`] through either the
//! `sqlite3` shell or the in-process driver, and the CSV it produces is
//! normalized into a typed [`TabularResult`]. [`GdpQueries`] wraps the fixed
//! template catalog on top of that.

pub mod backend;
mod client;
mod config;
mod descriptor;
mod events;
pub mod executor;
mod limits;
mod normalize;
mod probe;
mod query_error;
mod row_decode;
mod schema;
mod tabular;
pub mod templates;

pub use backend::{BackendKind, CliBackend, NativeBackend, QueryBackend};
pub use client::{GdpQueries, GeographicalAnalysis, SummaryStatistics, YearSpan};
pub use config::{
    BackendPreference, BridgeConfig, DEFAULT_MIN_COUNTRY_OBSERVATIONS, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_QUERY_TIMEOUT, DEFAULT_SQLITE_PROGRAM,
};
pub use descriptor::{OutputFormat, QueryDescriptor};
pub use events::{
    EventSeverity, EventSink, NullEventSink, QueryEvent, RecordingEventSink, TracingEventSink,
};
pub use executor::{ExecError, QueryExecutor};
pub use limits::QueryLimits;
pub use normalize::{
    normalize_csv, normalize_json_records, NormalizeError, Normalizer, TabularOutcomeExt,
};
pub use probe::{cli_available, probe_cli, ProbeReport};
pub use query_error::{QueryError, QueryErrorCode};
pub use row_decode::{decode_countries, decode_observations};
pub use schema::{COUNTRIES_TABLE, DATA_TABLE, STORE_SCHEMA};
pub use tabular::{Cell, Column, ColumnType, Record, TabularResult};
pub use templates::SortOrder;

pub const CRATE_NAME: &str = "gdp-atlas-query";

#[cfg(test)]
mod tests_support;
