use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "coderun", about = "Run source text through an external interpreter, streaming its output", version)]
#[command(group(ArgGroup::new("render").args(["json", "no_color"]).multiple(false)))]
pub struct Cli {
    /// Source file to execute; reads piped stdin when omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Interpreter executable (overrides INTERPRETER_PATH).
    #[arg(long)]
    pub interpreter: Option<String>,

    /// One-shot value forwarded to the program's standard input.
    #[arg(short = 'i', long)]
    pub input: Option<String>,

    /// Staged file extension (overrides SOURCE_EXT).
    #[arg(long)]
    pub ext: Option<String>,

    /// Directory to stage sources in (overrides STAGING_DIR).
    ///
    /// Defaults to the tmp/ subdirectory of the interpreter's own
    /// directory, which is also the child process's working directory.
    #[arg(long = "staging-dir")]
    pub staging_dir: Option<String>,

    /// Kill the run after this many seconds; 0 disables the limit.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Stage under a unique per-run file name instead of the fixed one.
    #[arg(long)]
    pub isolate: bool,

    /// Leave the staged file on disk after the run.
    #[arg(long = "keep-staged")]
    pub keep_staged: bool,

    /// Emit each run event as one JSON object per line.
    #[arg(long)]
    pub json: bool,

    /// Disable colored rendering of interpreter diagnostics.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
