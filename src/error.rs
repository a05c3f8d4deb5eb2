//! Error taxonomy for staging and interpreter runs.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors surfaced by the staging and session layers.
///
/// All variants are unrecoverable for the current run and are never
/// retried here. A non-zero interpreter exit is not an error — it is
/// reported as data via `RunEvent::Exited`.
#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    /// The staging directory or file could not be written.
    #[error("staging failed: {0}")]
    Stage(#[source] io::Error),

    /// The interpreter executable could not be started.
    #[error("failed to launch interpreter {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the interpreter's output faulted mid-stream. Lines already
    /// yielded remain valid; the rest are lost.
    #[error("reading interpreter output failed: {0}")]
    Stream(#[source] io::Error),

    /// The run exceeded the configured time limit and the child was killed.
    #[error("run exceeded {limit:?} and was terminated")]
    Timeout { limit: Duration },
}
