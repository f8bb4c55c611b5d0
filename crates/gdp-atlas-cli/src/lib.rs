// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod command_dispatch;
mod command_output_adapters;
mod commands;

use clap::{error::ErrorKind, ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use gdp_atlas_core::{
    env_bool, env_string, ConfigProfile, ExitCode, MachineError, ENV_GDP_ATLAS_LOG_JSON,
    ENV_GDP_ATLAS_LOG_LEVEL, ENV_GDP_ATLAS_PROFILE,
};
use gdp_atlas_query::QueryError;

use commands::{BackendCli, Commands};

const GDP_ATLAS_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "gdp-atlas", version)]
#[command(about = "Query the country indicator store")]
#[command(help_template = GDP_ATLAS_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  GDP_ATLAS_DB_PATH     Store location (default database/data.db)\n  GDP_ATLAS_BACKEND     auto, cli or native\n  GDP_ATLAS_SQLITE_BIN  sqlite3 shell to probe\n  GDP_ATLAS_LOG_LEVEL   Log verbosity override\n  GDP_ATLAS_LOG_JSON    Emit logs as JSON lines"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendCli>,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy)]
struct LogFlags {
    quiet: bool,
    verbose: u8,
    trace: bool,
}

impl LogFlags {
    const fn directive(self) -> Option<&'static str> {
        if self.trace {
            Some("trace")
        } else if self.verbose > 0 {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub(crate) json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success.as_u8()),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code.as_u8())
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };

    let command = cli.command.ok_or_else(|| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("usage_error", "missing command; see --help"),
    })?;
    init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
    });

    let overrides = command_dispatch::StoreOverrides {
        db: cli.db,
        backend: cli.backend.map(Into::into),
    };
    command_dispatch::run_command(command, &overrides, OutputMode { json: cli.json })
}

/// Filter precedence: command-line flags, `GDP_ATLAS_LOG_LEVEL`, `RUST_LOG`,
/// then the profile default (`info` without a profile).
fn log_filter(log_flags: LogFlags) -> EnvFilter {
    if let Some(directive) = log_flags.directive() {
        return EnvFilter::new(directive);
    }
    if let Some(filter) = env_string(ENV_GDP_ATLAS_LOG_LEVEL).and_then(|v| EnvFilter::try_new(v).ok()) {
        return filter;
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env_string(ENV_GDP_ATLAS_PROFILE)
            .map_or("info", |_| ConfigProfile::from_env().default_log_level());
        EnvFilter::new(level)
    })
}

fn init_tracing(log_flags: LogFlags) {
    let filter = log_filter(log_flags);
    // Logs share stderr with error reports; stdout carries command output only.
    let installed = if env_bool(ENV_GDP_ATLAS_LOG_JSON, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = installed {
        eprintln!("tracing subscriber already installed: {err}");
    }
}

#[derive(Debug)]
pub(crate) struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }
}

impl From<QueryError> for CliError {
    fn from(err: QueryError) -> Self {
        Self {
            exit_code: err.code.exit_code(),
            machine: MachineError::new(err.code.as_str(), &err.message),
        }
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match error.machine.to_json() {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use gdp_atlas_query::QueryErrorCode;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_flags_pick_the_loudest_request() {
        let flags = |quiet, verbose, trace| LogFlags {
            quiet,
            verbose,
            trace,
        };
        assert_eq!(flags(true, 1, true).directive(), Some("trace"));
        assert_eq!(flags(true, 2, false).directive(), Some("debug"));
        assert_eq!(flags(true, 0, false).directive(), Some("error"));
        assert_eq!(flags(false, 0, false).directive(), None);
    }

    #[test]
    fn query_errors_keep_their_code_and_exit_status() {
        let err = CliError::from(QueryError::validation("unknown metric `gdpx`"));
        assert_eq!(err.exit_code, ExitCode::Validation);
        assert_eq!(err.machine.code, "validation");

        let err = CliError::from(QueryError::new(QueryErrorCode::Unavailable, "no store"));
        assert_eq!(err.exit_code, ExitCode::DependencyFailure);
    }
}
