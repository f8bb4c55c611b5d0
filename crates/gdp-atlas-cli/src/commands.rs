// SPDX-License-Identifier: Apache-2.0

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use gdp_atlas_query::{BackendPreference, OutputFormat};

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Ask the sqlite3 shell for its version and report whether it is usable.
    Probe,
    /// List the tables in the store.
    Tables,
    /// Print the CREATE statement of one table.
    Schema { table: String },
    /// Row count plus a few sample rows of one table.
    Explore {
        table: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Country, observation and year-span totals.
    Summary,
    /// Run read-only SQL against the store.
    Query {
        #[arg(long)]
        sql: String,
        #[arg(long, value_enum)]
        format: Option<DisplayFormat>,
        /// Print the backend's own output instead of the normalized table.
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Highest (or lowest) countries for one indicator in one year.
    Top {
        #[arg(long)]
        metric: String,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = false)]
        ascending: bool,
        #[arg(long, value_enum)]
        format: Option<DisplayFormat>,
    },
    /// Write a query result to a CSV file.
    Export {
        #[arg(long)]
        sql: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum DisplayFormat {
    Table,
    Csv,
    Json,
}

impl DisplayFormat {
    pub(crate) const fn backend_format(self) -> OutputFormat {
        match self {
            Self::Table => OutputFormat::Table,
            Self::Csv => OutputFormat::Csv,
            Self::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum BackendCli {
    Auto,
    Cli,
    Native,
}

impl From<BackendCli> for BackendPreference {
    fn from(value: BackendCli) -> Self {
        match value {
            BackendCli::Auto => Self::Auto,
            BackendCli::Cli => Self::Cli,
            BackendCli::Native => Self::Native,
        }
    }
}
