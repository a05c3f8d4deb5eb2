//! Core orchestration for running submitted source text through an
//! external interpreter.
//!
//! The flow is two steps: [`stage::SourceStager`] writes the source to a
//! path the interpreter can open, then [`session::InterpreterSession`]
//! launches the interpreter against it and exposes its output as a lazy
//! stream of [`session::RunEvent`]s while the child is still running.
//! Presentation of the stream is the caller's business; the `coderun`
//! binary in this crate is one such caller.

pub mod config;
pub mod error;
pub mod session;
pub mod stage;

pub use error::RunnerError;
pub use session::{InterpreterSession, OutputLine, OutputSource, RunEvent, RunStream};
pub use stage::SourceStager;
