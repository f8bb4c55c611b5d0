#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use gdp_atlas_core::{ProcessError, ProcessPort, ProcessRequest, ProcessResult};
use gdp_atlas_query::STORE_SCHEMA;
use rusqlite::Connection;

/// Creates `data.db` under `dir` with the store schema plus `inserts`.
pub fn store_with(dir: &Path, inserts: &str) -> PathBuf {
    let path = dir.join("data.db");
    let conn = Connection::open(&path).expect("create store");
    conn.execute_batch(STORE_SCHEMA).expect("schema");
    conn.execute_batch(inserts).expect("rows");
    path
}

pub const SCENARIO_ROWS: &str = "
INSERT INTO countries VALUES
  ('US', 'United States', 38.0, -97.0),
  ('CN', 'China', 35.0, 105.0),
  ('DE', 'Germany', 51.0, 9.0);
INSERT INTO data (country_code, year, gdp) VALUES
  ('US', 2020, 21000.0),
  ('CN', 2020, 14000.0),
  ('DE', 2020, NULL);
";

/// Stand-in for the sqlite3 binary: replays scripted outcomes and keeps
/// every request it was handed.
#[derive(Default)]
pub struct FakeShell {
    outcomes: Mutex<VecDeque<Result<ProcessResult, ProcessError>>>,
    requests: Mutex<Vec<ProcessRequest>>,
}

impl FakeShell {
    pub fn new(outcomes: Vec<Result<ProcessResult, ProcessError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self::new(vec![])
    }

    pub fn ok(stdout: &str) -> Result<ProcessResult, ProcessError> {
        Ok(ProcessResult {
            status: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        })
    }

    pub fn not_found() -> Result<ProcessResult, ProcessError> {
        Err(ProcessError::NotFound("sqlite3".to_string()))
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stdin_of(&self, index: usize) -> String {
        self.requests()
            .get(index)
            .and_then(|r| r.stdin.clone())
            .map(|b| String::from_utf8(b).expect("utf8 script"))
            .unwrap_or_default()
    }
}

impl ProcessPort for FakeShell {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessResult, ProcessError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(ProcessError::NotFound(request.program.clone())))
    }
}
