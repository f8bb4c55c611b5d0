// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::time::Duration;

use gdp_atlas_core::{ProcessPort, ProcessRequest};

use crate::events::{EventSink, QueryEvent};

/// Outcome of asking the sqlite3 shell for its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub program: String,
    pub available: bool,
    /// Version line on success, failure reason otherwise.
    pub detail: String,
}

/// Runs `<program> --version` under `timeout`. Every failure mode (missing
/// binary, non-zero exit, timeout, I/O error) reports unavailable; none of
/// them is raised to the caller.
pub fn probe_cli(
    process: &dyn ProcessPort,
    program: &str,
    timeout: Duration,
    sink: &dyn EventSink,
) -> ProbeReport {
    let request = ProcessRequest::new(program, timeout).arg("--version");
    let (available, detail) = match process.run(&request) {
        Ok(out) if out.success() => (
            true,
            out.stdout_lossy()
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        ),
        Ok(out) => (
            false,
            format!(
                "`{program} --version` exited with status {}: {}",
                out.status,
                out.stderr_lossy().trim()
            ),
        ),
        Err(err) => (false, err.to_string()),
    };
    sink.emit(QueryEvent::BackendProbed {
        program: program.to_string(),
        available,
        detail: detail.clone(),
    });
    ProbeReport {
        program: program.to_string(),
        available,
        detail,
    }
}

#[must_use]
pub fn cli_available(
    process: &dyn ProcessPort,
    program: &str,
    timeout: Duration,
    sink: &dyn EventSink,
) -> bool {
    probe_cli(process, program, timeout, sink).available
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventSink;
    use crate::tests_support::ScriptedProcess;
    use gdp_atlas_core::ProcessError;

    #[test]
    fn version_output_marks_cli_available() {
        let process = ScriptedProcess::new(vec![ScriptedProcess::ok(
            "3.45.1 2024-01-30 16:01:20 abcdef\n",
        )]);
        let sink = RecordingEventSink::new();
        let report = probe_cli(&process, "sqlite3", Duration::from_secs(5), &sink);
        assert!(report.available);
        assert!(report.detail.starts_with("3.45.1"));
        assert_eq!(process.requests()[0].args, vec!["--version".to_string()]);
        assert_eq!(sink.count("backend_probed"), 1);
    }

    #[test]
    fn every_failure_mode_reports_unavailable() {
        let outcomes = vec![
            Err(ProcessError::NotFound("sqlite3".to_string())),
            Err(ProcessError::TimedOut {
                program: "sqlite3".to_string(),
                timeout: Duration::from_secs(5),
            }),
            Err(ProcessError::Io("broken pipe".to_string())),
            ScriptedProcess::failed(1, "bad option"),
        ];
        let sink = RecordingEventSink::new();
        for outcome in outcomes {
            let process = ScriptedProcess::new(vec![outcome]);
            assert!(!cli_available(
                &process,
                "sqlite3",
                Duration::from_secs(5),
                &sink
            ));
        }
        assert!(sink.errors().is_empty());
    }
}
