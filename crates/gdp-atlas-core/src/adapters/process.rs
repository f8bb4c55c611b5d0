// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::ports::{ProcessError, ProcessPort, ProcessRequest, ProcessResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `ProcessPort` backed by `std::process`. Output pipes are drained on
/// helper threads so a chatty child cannot stall on a full pipe while the
/// deadline loop polls it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcess;

impl ProcessPort for SystemProcess {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessResult, ProcessError> {
        let program = request.program.as_str();
        let mut command = Command::new(program);
        command
            .args(&request.args)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProcessError::NotFound(program.to_string()));
            }
            Err(e) => return Err(ProcessError::Io(format!("spawn `{program}` failed: {e}"))),
        };

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());
        let stdin_writer = match (&request.stdin, child.stdin.take()) {
            (Some(input), Some(pipe)) => Some(spawn_writer(pipe, input.clone())),
            _ => None,
        };

        let status = wait_with_deadline(&mut child, request)?;

        if let Some(writer) = stdin_writer {
            match writer.join() {
                Ok(Ok(())) => {}
                // The child may exit without reading all of its input.
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(ProcessError::Io(format!(
                        "write stdin of `{program}` failed: {e}"
                    )))
                }
                Err(_) => {
                    return Err(ProcessError::Io(format!(
                        "stdin writer for `{program}` panicked"
                    )))
                }
            }
        }
        let stdout = join_reader(stdout_reader, program, "stdout")?;
        let stderr = join_reader(stderr_reader, program, "stderr")?;

        Ok(ProcessResult {
            status,
            stdout,
            stderr,
        })
    }
}

fn wait_with_deadline(child: &mut Child, request: &ProcessRequest) -> Result<i32, ProcessError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status.code().unwrap_or(-1)),
            Ok(None) => {
                if started.elapsed() >= request.timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProcessError::TimedOut {
                        program: request.program.clone(),
                        timeout: request.timeout,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Io(format!(
                    "wait for `{}` failed: {e}",
                    request.program
                )));
            }
        }
    }
}

fn spawn_reader<R>(source: Option<R>) -> Option<JoinHandle<io::Result<Vec<u8>>>>
where
    R: Read + Send + 'static,
{
    source.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn spawn_writer<W>(mut pipe: W, input: Vec<u8>) -> JoinHandle<io::Result<()>>
where
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        pipe.write_all(&input)?;
        pipe.flush()
    })
}

fn join_reader(
    handle: Option<JoinHandle<io::Result<Vec<u8>>>>,
    program: &str,
    stream: &str,
) -> Result<Vec<u8>, ProcessError> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    handle
        .join()
        .map_err(|_| ProcessError::Io(format!("{stream} reader for `{program}` panicked")))?
        .map_err(|e| ProcessError::Io(format!("read {stream} of `{program}` failed: {e}")))
}
