//! Subprocess execution backed by `std::process`.
//!
//! stdout and stderr are read on separate threads and merged into one
//! transcript through a channel, so a chatty child can never block on a full
//! pipe while we wait on the other stream.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use taucf_core::ports::{ProcessCommand, ProcessExecutor, ProcessOutput};
use taucf_core::{CfError, CfResult};
use tracing::{debug, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessExecutor {
    timeout: Option<Duration>,
}

impl SystemProcessExecutor {
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill children that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

fn forward_lines<R: Read + Send + 'static>(stream: R, tx: mpsc::Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

impl ProcessExecutor for SystemProcessExecutor {
    fn run(&self, command: &ProcessCommand) -> CfResult<ProcessOutput> {
        let program = command.program();
        if program.is_empty() {
            return Err(CfError::internal("attempted to run an empty command line"));
        }
        debug!(command = %command, cwd = ?command.cwd, "running");

        let mut cmd = Command::new(program);
        for key in &command.env_remove {
            cmd.env_remove(key);
        }
        cmd.args(&command.argv[1..])
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| CfError::io(program, e))?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut lines = Vec::new();
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    trace!(target: "taucf::process", "{line}");
                    lines.push(line);
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        warn!(command = %command, "killing command after timeout");
                        let _ = child.kill();
                        let _ = child.wait();
                        let secs = self.timeout.map_or(0, |t| t.as_secs());
                        lines.push(format!("[killed after {secs}s timeout]"));
                        return Err(CfError::software_package(
                            program,
                            command.to_string(),
                            lines.join("\n"),
                        ));
                    }
                }
            }
        }

        let status = child.wait().map_err(|e| CfError::io(program, e))?;
        debug!(command = %command, code = ?status.code(), "finished");
        Ok(ProcessOutput {
            exit_code: status.code(),
            output: lines.join("\n"),
        })
    }
}
