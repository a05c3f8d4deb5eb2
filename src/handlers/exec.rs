//! Exec handler: stage the source, launch the interpreter, render output
//! as it arrives.

use std::io::{self, Write};

use anyhow::Result;
use futures_util::StreamExt;
use owo_colors::OwoColorize;

use coderun::{InterpreterSession, OutputSource, RunEvent, SourceStager};

pub struct ExecOptions {
    pub input: Option<String>,
    pub json: bool,
    pub color: bool,
    pub keep_staged: bool,
}

/// Stage `source`, run it, and drain the event stream to the terminal.
/// The staged file is removed afterwards (even when the run fails)
/// unless `keep_staged` is set.
pub async fn run(
    stager: &SourceStager,
    session: &InterpreterSession,
    source: &str,
    opts: &ExecOptions,
) -> Result<()> {
    let staged = stager.stage(source)?;
    let outcome = render(session, &staged, opts).await;
    if !opts.keep_staged {
        stager.remove(&staged);
    }
    outcome
}

async fn render(
    session: &InterpreterSession,
    staged: &std::path::Path,
    opts: &ExecOptions,
) -> Result<()> {
    let mut stream = session.run(staged, opts.input.as_deref()).await?;

    while let Some(event) = stream.next().await {
        let event = event?;
        if opts.json {
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush().ok();
            continue;
        }
        match event {
            RunEvent::Line(line) => {
                match line.source {
                    OutputSource::Stdout => println!("{}", line.text),
                    OutputSource::Stderr if opts.color => eprintln!("{}", line.text.red()),
                    OutputSource::Stderr => eprintln!("{}", line.text),
                }
                // Keep output incremental even when stdout is a pipe.
                io::stdout().flush().ok();
            }
            RunEvent::Exited { code } => {
                let note = match code {
                    Some(0) => None,
                    Some(n) => Some(format!("[interpreter exited with status {}]", n)),
                    None => Some("[interpreter terminated by signal]".to_string()),
                };
                if let Some(note) = note {
                    if opts.color {
                        eprintln!("{}", note.red());
                    } else {
                        eprintln!("{}", note);
                    }
                }
            }
        }
    }
    Ok(())
}
