mod cli;
mod handlers;

use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;

use coderun::config::Config;
use coderun::{InterpreterSession, SourceStager};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_target(false)
        .compact()
        .init();

    // Load config
    let cfg = Config::load();

    // Resolve interpreter: CLI overrides config; there is no default.
    let interpreter = args
        .interpreter
        .clone()
        .map(PathBuf::from)
        .or_else(|| cfg.get_path("INTERPRETER_PATH"))
        .context("no interpreter configured; pass --interpreter or set INTERPRETER_PATH")?;

    // Source text: positional file, or piped stdin.
    let source = match args.file.as_deref() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file '{}'", path))?,
        None => {
            if io::stdin().is_terminal() {
                bail!("no source provided; pass a FILE or pipe source on stdin");
            }
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    // An explicit --timeout 0 disables the configured limit.
    let timeout = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => cfg.run_timeout(),
    };
    let session = InterpreterSession::new(&interpreter).with_timeout(timeout);

    // Staging dir: CLI > config > tmp/ beside the interpreter.
    let staging_dir = args
        .staging_dir
        .clone()
        .map(PathBuf::from)
        .or_else(|| cfg.get_path("STAGING_DIR"))
        .unwrap_or_else(|| match session.workdir() {
            Some(dir) => dir.join("tmp"),
            None => PathBuf::from("tmp"),
        });
    let ext = args
        .ext
        .clone()
        .or_else(|| cfg.get("SOURCE_EXT"))
        .unwrap_or_else(|| "src".into());
    let stager = SourceStager::new(staging_dir, ext)
        .with_isolation(args.isolate || cfg.get_bool("STAGE_ISOLATED"));

    let opts = handlers::exec::ExecOptions {
        input: args.input.clone(),
        json: args.json,
        color: !args.no_color && !args.json && io::stdout().is_terminal(),
        keep_staged: args.keep_staged || cfg.get_bool("KEEP_STAGED"),
    };

    handlers::exec::run(&stager, &session, &source, &opts).await
}
