//! The temporary-binding compiler CLI.
//!
//! Provides the `tbindc` command with the following subcommands:
//!
//! - `tbindc lower <files...>` - Lower each file and print or write the result
//! - `tbindc check <files...>` - Report diagnostics only
//! - `tbindc run <file>` - Lower a file and run it with the reference interpreter
//! - `tbindc cst <file>` - Print the concrete syntax tree
//!
//! Options shared by `lower`, `check` and `run`:
//! - `--config` - Path to a `tbind.toml` (default: `./tbind.toml` if present)
//! - `--target` - Output dialect, `es5` or `es2015`
//! - `--deny-warnings` - Fail a unit that has warnings
//! - `--keep-rejected` - Emit rejected constructs unchanged instead of dropping them
//! - `--json` - Output diagnostics as JSON (one object per line)
//! - `--no-color` - Disable colorized output

mod discovery;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tbind_emit::{emit, EmitConfig};
use tbind_eval::EvalConfig;
use tbind_lower::{lower_source, Config, Diagnostic, LowerResult, RejectPolicy, Target};

use crate::discovery::{collect_inputs, map_path, output_path, Input};

/// Looked up in the working directory when `--config` is not given.
const CONFIG_FILE: &str = "tbind.toml";

#[derive(Parser)]
#[command(name = "tbindc", version, about = "Lowers temporary bindings to plain JavaScript")]
struct Cli {
    /// Raise the log level (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower each file; a single file without --output goes to stdout
    Lower {
        /// Source files or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a span map (`<out>.map.json`) next to each output file
        #[arg(long)]
        map: bool,

        #[command(flatten)]
        opts: UnitOptions,
    },
    /// Report diagnostics without writing anything
    Check {
        /// Source files or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        opts: UnitOptions,
    },
    /// Lower a file and run it, printing what it logs
    Run {
        file: PathBuf,

        /// Statements and calls executed before the run is stopped
        #[arg(long = "max-steps")]
        max_steps: Option<u64>,

        #[command(flatten)]
        opts: UnitOptions,
    },
    /// Print the concrete syntax tree of a file
    Cst { file: PathBuf },
}

#[derive(Args)]
struct UnitOptions {
    /// Path to a tbind.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output dialect
    #[arg(long, value_enum)]
    target: Option<TargetArg>,

    /// Fail a unit that has warnings
    #[arg(long = "deny-warnings")]
    deny_warnings: bool,

    /// Emit rejected constructs unchanged instead of dropping them
    #[arg(long = "keep-rejected")]
    keep_rejected: bool,

    /// Output diagnostics as JSON (one object per line) instead of human-readable format
    #[arg(long)]
    json: bool,

    /// Disable colorized output
    #[arg(long = "no-color")]
    no_color: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Es5,
    Es2015,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Es5 => Target::Es5,
            TargetArg::Es2015 => Target::Es2015,
        }
    }
}

/// How diagnostics are printed.
#[derive(Clone, Copy)]
struct DiagnosticOptions {
    color: bool,
    json: bool,
}

impl UnitOptions {
    fn diagnostics(&self) -> DiagnosticOptions {
        DiagnosticOptions {
            color: !self.no_color && !self.json,
            json: self.json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (result, json) = match &cli.command {
        Commands::Lower {
            files,
            output,
            map,
            opts,
        } => (lower(files, output.as_deref(), *map, opts), opts.json),
        Commands::Check { files, opts } => (check(files, opts), opts.json),
        Commands::Run {
            file,
            max_steps,
            opts,
        } => (run(file, *max_steps, opts), opts.json),
        Commands::Cst { file } => (cst(file), false),
    };

    if let Err(e) = result {
        if json {
            // In JSON mode, emit the final error as JSON too.
            let msg = serde_json::json!({
                "code": "C0001",
                "severity": "error",
                "message": e,
                "file": "",
            });
            eprintln!("{}", msg);
        } else {
            eprintln!("error: {}", e);
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// The config file, then the flags on top of it.
fn load_config(opts: &UnitOptions) -> Result<Config, String> {
    let mut config = match &opts.config {
        Some(path) => Config::from_file(path).map_err(|e| e.to_string())?,
        None if Path::new(CONFIG_FILE).is_file() => {
            debug!(path = CONFIG_FILE, "using config from working directory");
            Config::from_file(Path::new(CONFIG_FILE)).map_err(|e| e.to_string())?
        }
        None => Config::default(),
    };
    if let Some(target) = opts.target {
        config.lower.target = target.into();
    }
    if opts.keep_rejected {
        config.lower.on_reject = RejectPolicy::Keep;
    }
    if opts.deny_warnings {
        config.diagnostics.deny_warnings = true;
    }
    Ok(config)
}

fn read_source(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}

/// A lowered unit and whether it counts as failed.
struct Lowered {
    result: LowerResult,
    failed: bool,
}

fn lower_input(
    input: &Input,
    config: &Config,
    diag_opts: DiagnosticOptions,
) -> Result<Lowered, String> {
    let source = read_source(&input.path)?;
    let result = lower_source(&source, &config.lower);
    report_diagnostics(&source, &input.path, &result.diagnostics, diag_opts);

    let failed =
        !result.ok() || (config.diagnostics.deny_warnings && result.has_warnings());
    debug!(
        file = %input.path.display(),
        constructs = result.constructs.len(),
        diagnostics = result.diagnostics.len(),
        failed,
        "unit lowered"
    );
    Ok(Lowered {
        result,
        failed,
    })
}

/// Print diagnostics to stderr, rendered or as JSON lines.
fn report_diagnostics(
    source: &str,
    path: &Path,
    diagnostics: &[Diagnostic],
    diag_opts: DiagnosticOptions,
) {
    let file_name = path.display().to_string();
    for diagnostic in diagnostics {
        if diag_opts.json {
            eprintln!("{}", diagnostic.to_json(&file_name, source));
        } else {
            eprint!("{}", diagnostic.render(&file_name, source, diag_opts.color));
        }
    }
}

fn failure_summary(failed: usize, total: usize) -> Result<(), String> {
    if failed == 0 {
        Ok(())
    } else if total == 1 {
        Err("Lowering failed due to errors above.".to_string())
    } else {
        Err(format!("{failed} of {total} units failed"))
    }
}

/// `tbindc lower`. Output is written for every unit that parsed, even when a
/// construct in it was rejected; the exit status still reports the failure.
fn lower(
    files: &[PathBuf],
    output: Option<&Path>,
    map: bool,
    opts: &UnitOptions,
) -> Result<(), String> {
    let config = load_config(opts)?;
    let inputs = collect_inputs(files)?;
    if inputs.is_empty() {
        return Err("no source files found".to_string());
    }
    if output.is_none() && inputs.len() > 1 {
        return Err("lowering several files needs an output directory (--output)".to_string());
    }
    if output.is_none() && map {
        return Err("--map needs an output directory (--output)".to_string());
    }

    let diag_opts = opts.diagnostics();
    let mut failed = 0;
    for input in &inputs {
        let unit = lower_input(input, &config, diag_opts)?;
        if unit.failed {
            failed += 1;
        }
        if !unit.result.parse_errors.is_empty() {
            continue;
        }

        let emitted = emit(&unit.result.program, &EmitConfig::default());
        let Some(out_dir) = output else {
            print!("{}", emitted.code);
            continue;
        };

        let dest = output_path(out_dir, input);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
        std::fs::write(&dest, &emitted.code)
            .map_err(|e| format!("Failed to write '{}': {}", dest.display(), e))?;
        info!(from = %input.path.display(), to = %dest.display(), "wrote lowered unit");

        if map {
            let map_file = map_path(&dest);
            let doc = serde_json::json!({
                "file": dest.display().to_string(),
                "source": input.path.display().to_string(),
                "mappings": emitted.mappings,
            });
            std::fs::write(&map_file, format!("{doc}\n"))
                .map_err(|e| format!("Failed to write '{}': {}", map_file.display(), e))?;
        }
        if !opts.json {
            eprintln!("  Lowered: {}", dest.display());
        }
    }

    failure_summary(failed, inputs.len())
}

/// `tbindc check`.
fn check(files: &[PathBuf], opts: &UnitOptions) -> Result<(), String> {
    let config = load_config(opts)?;
    let inputs = collect_inputs(files)?;
    if inputs.is_empty() {
        return Err("no source files found".to_string());
    }

    let diag_opts = opts.diagnostics();
    let mut failed = 0;
    for input in &inputs {
        if lower_input(input, &config, diag_opts)?.failed {
            failed += 1;
        }
    }
    failure_summary(failed, inputs.len())
}

/// `tbindc run`.
fn run(file: &Path, max_steps: Option<u64>, opts: &UnitOptions) -> Result<(), String> {
    let config = load_config(opts)?;
    let input = Input {
        path: file.to_path_buf(),
        relative: PathBuf::new(),
    };
    let unit = lower_input(&input, &config, opts.diagnostics())?;
    if unit.failed {
        return failure_summary(1, 1);
    }

    let mut eval_config = EvalConfig::default();
    if let Some(max_steps) = max_steps {
        eval_config.max_steps = max_steps;
    }
    let outcome = tbind_eval::run(&unit.result.program, &eval_config);
    print!("{}", outcome.stdout());
    outcome
        .result
        .map(|_| ())
        .map_err(|e| format!("uncaught {e}"))
}

/// `tbindc cst`.
fn cst(file: &Path) -> Result<(), String> {
    let source = read_source(file)?;
    let parse = tbind_parser::parse(&source);
    print!("{}", tbind_parser::debug_tree(&parse.syntax()));

    let diagnostics: Vec<Diagnostic> = parse
        .errors()
        .iter()
        .map(Diagnostic::from_parse_error)
        .collect();
    report_diagnostics(
        &source,
        file,
        &diagnostics,
        DiagnosticOptions {
            color: false,
            json: false,
        },
    );
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(format!("{} parse errors", diagnostics.len()))
    }
}
