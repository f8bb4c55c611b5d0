// SPDX-License-Identifier: Apache-2.0

use rusqlite::Connection;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use gdp_atlas_core::{ProcessError, ProcessPort, ProcessRequest, ProcessResult};

use crate::backend::{BackendKind, QueryBackend};
use crate::descriptor::QueryDescriptor;
use crate::executor::ExecError;
use crate::schema::STORE_SCHEMA;

/// Process port that replays queued outcomes and records every request.
pub struct ScriptedProcess {
    outcomes: Mutex<VecDeque<Result<ProcessResult, ProcessError>>>,
    requests: Mutex<Vec<ProcessRequest>>,
}

impl ScriptedProcess {
    pub fn new(outcomes: Vec<Result<ProcessResult, ProcessError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(stdout: &str) -> Result<ProcessResult, ProcessError> {
        Ok(ProcessResult {
            status: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        })
    }

    pub fn failed(status: i32, stderr: &str) -> Result<ProcessResult, ProcessError> {
        Ok(ProcessResult {
            status,
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessPort for ScriptedProcess {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessResult, ProcessError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(ProcessError::Io("no scripted outcome left".to_string())))
    }
}

/// Backend that answers from a queue of canned outputs.
pub struct CannedBackend {
    kind: BackendKind,
    outputs: Mutex<VecDeque<Result<String, ExecError>>>,
}

impl CannedBackend {
    pub fn new(kind: BackendKind, outputs: Vec<Result<String, ExecError>>) -> Self {
        Self {
            kind,
            outputs: Mutex::new(outputs.into()),
        }
    }
}

impl QueryBackend for CannedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn execute(&self, _query: &QueryDescriptor) -> Result<String, ExecError> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(ExecError::Driver("no canned output left".to_string())))
    }
}

pub const FIXTURE_ROWS: &str = "
INSERT INTO countries VALUES
  ('US', 'United States', 38.0, -97.0),
  ('CN', 'China', 35.0, 105.0),
  ('DE', 'Germany', 51.0, 9.0),
  ('JP', 'Japan', 36.0, 138.0),
  ('BR', 'Brazil', -10.0, -55.0),
  ('NZ', 'New Zealand', -41.0, 174.0),
  ('KR', 'Korea, Rep.', 37.0, 127.5),
  ('XK', 'Kosovo', NULL, NULL);
INSERT INTO data (country_code, year, gdp, population, life_expectancy, migration, internet) VALUES
  ('US', 2016, 18700.0, 323000000, 78.5, 1000000, 85.5),
  ('US', 2017, 19500.0, 325000000, 78.5, 950000, 87.3),
  ('US', 2018, 20500.0, 327000000, 78.6, 900000, 88.5),
  ('US', 2019, 21400.0, 328000000, 78.8, 850000, 89.4),
  ('US', 2020, 21000.0, 331000000, 77.0, -50000, 90.9),
  ('CN', 2016, 11200.0, 1379000000, 76.2, -300000, 53.2),
  ('CN', 2017, 12300.0, 1386000000, 76.5, -300000, 54.3),
  ('CN', 2018, 13900.0, 1393000000, 76.7, -300000, 59.2),
  ('CN', 2019, 14300.0, 1398000000, 77.0, -300000, 64.1),
  ('CN', 2020, 14700.0, 1402000000, 77.1, -300000, 70.1),
  ('DE', 2016, 3500.0, 82000000, 80.9, 500000, 84.2),
  ('DE', 2017, 3700.0, 82500000, 80.9, 400000, 84.4),
  ('DE', 2018, 3900.0, 82900000, 81.0, 380000, 87.0),
  ('DE', 2019, 3900.0, 83100000, 81.3, 300000, 88.1),
  ('DE', 2020, 3800.0, 83200000, 81.0, 200000, 89.8),
  ('JP', 2020, NULL, 126000000, 84.6, 70000, 90.2),
  ('BR', 2020, 0.0, 212000000, 74.0, 20000, 81.3),
  ('NZ', 2019, 210.0, 4900000, 82.0, 50000, 90.8),
  ('NZ', 2020, 212.0, 5000000, 82.2, 60000, 91.5),
  ('KR', 2020, 1640.0, 51800000, 83.4, 30000, 96.5),
  ('XK', 2020, NULL, 1800000, 79.0, -20000, 76.6);
";

/// Writes a seeded store under `dir` and returns its path.
pub fn seed_store(dir: &Path) -> PathBuf {
    let path = dir.join("data.db");
    let conn = Connection::open(&path).expect("create fixture store");
    conn.execute_batch(STORE_SCHEMA).expect("schema");
    conn.execute_batch(FIXTURE_ROWS).expect("fixture rows");
    path
}
