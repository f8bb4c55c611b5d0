// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gdp_atlas_core::{
    env_duration_ms, env_string, resolve_db_path, ENV_GDP_ATLAS_BACKEND,
    ENV_GDP_ATLAS_PROBE_TIMEOUT_MS, ENV_GDP_ATLAS_QUERY_TIMEOUT_MS, ENV_GDP_ATLAS_SQLITE_BIN,
};

use crate::limits::QueryLimits;
use crate::query_error::QueryError;

pub const DEFAULT_SQLITE_PROGRAM: &str = "sqlite3";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MIN_COUNTRY_OBSERVATIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Probe the shell once and use it when it answers.
    #[default]
    Auto,
    /// Require the shell; startup fails when the probe does.
    Cli,
    /// Never spawn the shell.
    Native,
}

impl BackendPreference {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cli => "cli",
            Self::Native => "native",
        }
    }
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cli" | "sqlite3" => Ok(Self::Cli),
            "native" | "driver" => Ok(Self::Native),
            other => Err(format!(
                "unknown backend `{other}`; expected auto, cli or native"
            )),
        }
    }
}

impl Display for BackendPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub db_path: PathBuf,
    pub sqlite_program: String,
    pub probe_timeout: Duration,
    pub query_timeout: Duration,
    pub backend: BackendPreference,
    pub min_country_observations: u32,
    pub limits: QueryLimits,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(gdp_atlas_core::DEFAULT_DB_PATH),
            sqlite_program: DEFAULT_SQLITE_PROGRAM.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            backend: BackendPreference::Auto,
            min_country_observations: DEFAULT_MIN_COUNTRY_OBSERVATIONS,
            limits: QueryLimits::default(),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn for_store(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    /// Reads `GDP_ATLAS_*` overrides on top of the defaults.
    pub fn from_env() -> Result<Self, QueryError> {
        let backend = match env_string(ENV_GDP_ATLAS_BACKEND) {
            Some(raw) => raw.parse().map_err(QueryError::validation)?,
            None => BackendPreference::Auto,
        };
        let cfg = Self {
            db_path: resolve_db_path(),
            sqlite_program: env_string(ENV_GDP_ATLAS_SQLITE_BIN)
                .unwrap_or_else(|| DEFAULT_SQLITE_PROGRAM.to_string()),
            probe_timeout: env_duration_ms(ENV_GDP_ATLAS_PROBE_TIMEOUT_MS, DEFAULT_PROBE_TIMEOUT),
            query_timeout: env_duration_ms(ENV_GDP_ATLAS_QUERY_TIMEOUT_MS, DEFAULT_QUERY_TIMEOUT),
            backend,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(QueryError::validation("db path must not be empty"));
        }
        if self.sqlite_program.trim().is_empty() {
            return Err(QueryError::validation("sqlite program must not be empty"));
        }
        if self.probe_timeout.is_zero() || self.query_timeout.is_zero() {
            return Err(QueryError::validation("timeouts must be greater than zero"));
        }
        if self.limits.max_limit == 0 {
            return Err(QueryError::validation("max_limit must be greater than zero"));
        }
        Ok(())
    }
}
