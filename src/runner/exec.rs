//! Spawning tool executables and collecting their output.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::CaptureResult;

/// How long to sleep between checks while draining readers.
const DRAIN_POLL: Duration = Duration::from_millis(5);

/// Error type for runner operations.
///
/// A child that runs and fails is not an error; that is a non-zero status in
/// the [`CaptureResult`]. Errors here mean the child never ran or could not
/// be observed.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to attach {0} pipe")]
    Pipe(&'static str),

    #[error("failed to wait for child: {0}")]
    Wait(#[from] std::io::Error),
}

/// Executes one tool invocation and captures its output.
///
/// A tool may fork a background worker that inherits the output pipes and
/// keeps them open after the tool itself exits. The runner therefore never
/// waits for pipe EOF: it polls for the direct child's exit, grants the
/// readers a short drain window, and then takes whatever the buffers hold.
/// Trailing output from such descendants may be truncated.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    /// Interval between child exit checks
    poll_interval: Duration,

    /// Grace period for readers after the direct child exits
    drain_window: Duration,
}

impl ToolRunner {
    /// Create a runner with default timing (25 ms poll, 50 ms drain).
    pub fn new() -> Self {
        Self { poll_interval: Duration::from_millis(25), drain_window: Duration::from_millis(50) }
    }

    /// Set the child exit poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the reader drain window.
    #[must_use]
    pub fn drain_window(mut self, window: Duration) -> Self {
        self.drain_window = window;
        self
    }

    /// Run `exec_path subcommand [argument]` and capture its output.
    ///
    /// The child gets no stdin and inherits the server's working directory
    /// and environment. The argument, when present, is passed as a single
    /// positional argument even if empty.
    pub fn run(
        &self,
        exec_path: &Path,
        subcommand: &str,
        argument: Option<&str>,
    ) -> Result<CaptureResult, RunnerError> {
        let start = Instant::now();

        let mut cmd = Command::new(exec_path);
        cmd.arg(subcommand);
        if let Some(arg) = argument {
            cmd.arg(arg);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            path: exec_path.to_path_buf(),
            source,
        })?;

        let stdout_pipe = child.stdout.take().ok_or(RunnerError::Pipe("stdout"))?;
        let stderr_pipe = child.stderr.take().ok_or(RunnerError::Pipe("stderr"))?;

        // One reader per pipe; both feed the shared combined buffer so the
        // interleaving reflects arrival order.
        let combined = Arc::new(Mutex::new(Vec::new()));
        let stdout_reader = StreamReader::spawn_stdout(stdout_pipe, Arc::clone(&combined));
        let stderr_reader = StreamReader::spawn_stderr(stderr_pipe, Arc::clone(&combined));

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunnerError::Wait(e));
                }
            }
        };

        // The child is gone; give the readers a moment to pull buffered
        // bytes, then snapshot. Readers still blocked on a descendant's
        // open pipe are abandoned and exit on eventual EOF.
        let deadline = Instant::now() + self.drain_window;
        while !(stdout_reader.is_done() && stderr_reader.is_done()) && Instant::now() < deadline {
            thread::sleep(DRAIN_POLL);
        }

        let result = CaptureResult {
            status: exit_code(status),
            stdout: stdout_reader.snapshot(),
            stderr: stderr_reader.snapshot(),
            combined: combined.lock().clone(),
        };

        tracing::debug!(
            path = %exec_path.display(),
            subcommand,
            status = result.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tool invocation finished"
        );

        Ok(result)
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// A detached reader thread accumulating one output stream.
struct StreamReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: Arc<AtomicBool>,
}

impl StreamReader {
    fn spawn_stdout(pipe: ChildStdout, combined: Arc<Mutex<Vec<u8>>>) -> Self {
        Self::spawn(pipe, combined)
    }

    fn spawn_stderr(pipe: ChildStderr, combined: Arc<Mutex<Vec<u8>>>) -> Self {
        Self::spawn(pipe, combined)
    }

    fn spawn(mut pipe: impl Read + Send + 'static, combined: Arc<Mutex<Vec<u8>>>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(AtomicBool::new(false));

        let thread_buffer = Arc::clone(&buffer);
        let thread_done = Arc::clone(&done);
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        thread_buffer.lock().extend_from_slice(&chunk[..n]);
                        combined.lock().extend_from_slice(&chunk[..n]);
                    }
                }
            }
            thread_done.store(true, Ordering::SeqCst);
        });

        Self { buffer, done }
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }
}

/// Map an [`ExitStatus`] to a small stable integer.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(-1)
}
