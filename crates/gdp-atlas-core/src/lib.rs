// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod ports;

pub use adapters::SystemProcess;
pub use domain::config::{
    env_bool, env_duration_ms, env_string, resolve_db_path, ConfigProfile, DEFAULT_DB_PATH,
};
pub use errors::{ExitCode, MachineError};
pub use ports::{ProcessError, ProcessPort, ProcessRequest, ProcessResult};

pub const CRATE_NAME: &str = "gdp-atlas-core";

pub const ENV_GDP_ATLAS_LOG_LEVEL: &str = "GDP_ATLAS_LOG_LEVEL";
pub const ENV_GDP_ATLAS_LOG_JSON: &str = "GDP_ATLAS_LOG_JSON";
pub const ENV_GDP_ATLAS_PROFILE: &str = "GDP_ATLAS_PROFILE";
pub const ENV_GDP_ATLAS_DB_PATH: &str = "GDP_ATLAS_DB_PATH";
pub const ENV_GDP_ATLAS_SQLITE_BIN: &str = "GDP_ATLAS_SQLITE_BIN";
pub const ENV_GDP_ATLAS_PROBE_TIMEOUT_MS: &str = "GDP_ATLAS_PROBE_TIMEOUT_MS";
pub const ENV_GDP_ATLAS_QUERY_TIMEOUT_MS: &str = "GDP_ATLAS_QUERY_TIMEOUT_MS";
pub const ENV_GDP_ATLAS_BACKEND: &str = "GDP_ATLAS_BACKEND";
