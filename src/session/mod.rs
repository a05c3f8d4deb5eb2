//! Interpreter session: spawns the external interpreter over a staged
//! source file and exposes its output as a lazy stream of events.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use async_stream::try_stream;
use futures_core::Stream;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::RunnerError;

/// Which of the child's output channels a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSource {
    Stdout,
    Stderr,
}

/// One line of interpreter output, terminator stripped.
#[derive(Debug, Clone, Serialize)]
pub struct OutputLine {
    pub source: OutputSource,
    pub text: String,
}

/// Element of the run stream. Lines arrive in emission order; `Exited` is
/// yielded exactly once, after the last line, and ends the stream. A
/// non-zero code is data for the caller, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RunEvent {
    Line(OutputLine),
    Exited { code: Option<i32> },
}

pub type RunStream = Pin<Box<dyn Stream<Item = Result<RunEvent, RunnerError>> + Send>>;

/// Launches the interpreter as a child process and owns it for the whole
/// run: one-shot stdin delivery, line-wise output multiplexing, and
/// teardown when the run ends, times out, or is abandoned.
#[derive(Debug, Clone)]
pub struct InterpreterSession {
    interpreter: PathBuf,
    workdir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl InterpreterSession {
    /// The child's working directory is the interpreter's own directory,
    /// so staged paths expressed relative to it resolve the same way no
    /// matter where the caller runs from. A bare command name has no
    /// directory; the caller's cwd is inherited in that case.
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        let interpreter = interpreter.into();
        let workdir = interpreter
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Self {
            interpreter,
            workdir,
            timeout: None,
        }
    }

    /// Bound the whole run; the child is killed when the limit elapses.
    /// `None` (the default) leaves the run bounded only by the child.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Spawn the interpreter over `staged` and return the lazy event
    /// stream. Each poll suspends the calling task until a line is ready,
    /// the child exits, the time limit fires, or a read faults.
    pub async fn run(&self, staged: &Path, input: Option<&str>) -> Result<RunStream, RunnerError> {
        let arg = self.staged_arg(staged)?;

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&arg)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        debug!(
            interpreter = %self.interpreter.display(),
            arg = %arg.display(),
            "spawning interpreter"
        );
        let mut child = cmd.spawn().map_err(|e| RunnerError::Spawn {
            path: self.interpreter.clone(),
            source: e,
        })?;

        // One-shot input delivery, then close stdin either way so the
        // child sees EOF instead of blocking on a value that will never
        // come. A child that exits without reading is not an error.
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(value) = input {
                if let Err(e) = write_input(&mut stdin, value).await {
                    warn!(error = %e, "interpreter closed stdin before input was delivered");
                }
            }
            drop(stdin);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Result<RunEvent, RunnerError>>();
        let out_task = spawn_line_reader(child.stdout.take(), OutputSource::Stdout, tx.clone());
        let err_task = spawn_line_reader(child.stderr.take(), OutputSource::Stderr, tx.clone());

        let timeout = self.timeout;
        tokio::spawn(async move {
            enum Outcome {
                Exited(Option<i32>),
                Abandoned,
                TimedOut(Duration),
            }

            let outcome = tokio::select! {
                status = child.wait() => Outcome::Exited(status.ok().and_then(|s| s.code())),
                _ = tx.closed() => Outcome::Abandoned,
                _ = tokio::time::sleep(timeout.unwrap_or_default()), if timeout.is_some() => {
                    Outcome::TimedOut(timeout.unwrap_or_default())
                }
            };

            match outcome {
                Outcome::Exited(code) => {
                    // Drain whatever is still buffered in the pipes before
                    // the exit event goes out.
                    let _ = out_task.await;
                    let _ = err_task.await;
                    debug!(?code, "interpreter exited");
                    let _ = tx.send(Ok(RunEvent::Exited { code }));
                }
                Outcome::Abandoned => {
                    debug!("run stream dropped before exhaustion, killing interpreter");
                    let _ = child.kill().await;
                    // The readers wind down on their own once the pipes
                    // close; nothing is left to receive their lines.
                }
                Outcome::TimedOut(limit) => {
                    warn!(?limit, "run exceeded time limit, killing interpreter");
                    let _ = child.kill().await;
                    // Lines queued before this point stay deliverable; the
                    // rest of the run is lost. The error is sent without
                    // waiting on the readers, which can stay blocked as
                    // long as an orphaned grandchild holds a pipe open.
                    let _ = tx.send(Err(RunnerError::Timeout { limit }));
                }
            }
        });

        let stream: RunStream = Box::pin(try_stream! {
            while let Some(item) = rx.recv().await {
                let event = item?;
                let last = matches!(event, RunEvent::Exited { .. });
                yield event;
                if last {
                    break;
                }
            }
        });
        Ok(stream)
    }

    /// Argument form of the staged path: relative to the interpreter's
    /// directory when the file lies beneath it, absolute otherwise so the
    /// cwd change cannot break resolution.
    fn staged_arg(&self, staged: &Path) -> Result<PathBuf, RunnerError> {
        let Some(dir) = &self.workdir else {
            return Ok(staged.to_path_buf());
        };
        if let Ok(rel) = staged.strip_prefix(dir) {
            return Ok(rel.to_path_buf());
        }
        staged.canonicalize().map_err(RunnerError::Stage)
    }
}

async fn write_input(stdin: &mut ChildStdin, value: &str) -> std::io::Result<()> {
    stdin.write_all(value.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

/// Forward one output channel into the shared event channel, one line per
/// event, until end-of-stream, a read fault, or the consumer goes away.
fn spawn_line_reader<R>(
    reader: Option<R>,
    source: OutputSource,
    tx: mpsc::UnboundedSender<Result<RunEvent, RunnerError>>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(reader) = reader else {
            return;
        };
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => {
                    if tx
                        .send(Ok(RunEvent::Line(OutputLine { source, text })))
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(RunnerError::Stream(e)));
                    break;
                }
            }
        }
    })
}
