use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use clap::Parser as ClapParser;
use colored::*;
use thiserror::Error;
use tracing::debug;

extern crate runtime;

use runtime::config::{ConfigError, MAX_CALL_DEPTH_LIMIT};
use runtime::interpreter::RunError;
use runtime::{Config, Context, Interpreter, Value};

const DEFAULT_CONFIG_FILE: &str = "env.def";

// --------
//   CLI
// --------

#[derive(ClapParser)]
#[command(version)]
#[command(about = "Interpreter for the Yan language")]
struct Cli {
    /// Script to run. Starts the interactive mode when missing
    file: Option<PathBuf>,

    /// Interactive mode after running the file, in its global scope
    #[arg(short, long)]
    interactive: bool,

    /// Prints the syntax tree of each evaluated unit
    #[arg(long)]
    ast: bool,

    /// Maximum depth of nested calls, from 1 to 500
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Configuration file of `key=value` definitions
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Arguments given to the script, available as `args`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Error opening script file '{0}': {1}")]
    Script(String, io::Error),

    #[error("Error reading from terminal: {0}")]
    Terminal(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Maximum call depth must be between 1 and {max} (got {0})", max = MAX_CALL_DEPTH_LIMIT)]
    InvalidDepth(usize),
}

// Logging stays silent unless RUST_LOG is set
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(io::stderr))
            .with(filter)
            .init();
    }
}

// File values first, then the command line flags
fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = Config::load(&path)?;

    if let Some(depth) = cli.max_depth {
        if !(1..=MAX_CALL_DEPTH_LIMIT).contains(&depth) {
            return Err(CliError::InvalidDepth(depth));
        }
        config.max_call_depth = depth;
    }

    debug!(
        max_call_depth = config.max_call_depth,
        import_path = %config.import_path.display(),
        "configuration loaded"
    );

    Ok(config)
}

// Parses and runs one unit: a file or a line of the interactive mode
fn run_unit(
    interp: &Interpreter,
    ctx: &Rc<Context>,
    source: &str,
    filename: &str,
    show_ast: bool,
) -> Result<Vec<Value>, RunError> {
    let program = Interpreter::parse(source, filename)?;

    if show_ast {
        println!("{}", program.to_string().bright_black());
    }

    interp
        .execute_program(&program, ctx)
        .map_err(RunError::Runtime)
}

// Returns false when the script stopped on an error
fn interpret_file(interp: &Interpreter, ctx: &Rc<Context>, path: &Path, cli: &Cli) -> Result<bool, CliError> {
    let source = fs::read_to_string(path).map_err(|e| CliError::Script(path.display().to_string(), e))?;

    match run_unit(interp, ctx, &source, &path.display().to_string(), cli.ast) {
        Ok(_) => Ok(true),
        Err(e) => {
            eprintln!("{e}");
            Ok(false)
        }
    }
}

fn echo(values: &[Value]) {
    match values {
        [] => {}
        [value] => println!("{} {}", "=".green(), value.repr()),
        _ => {
            for (i, value) in values.iter().enumerate() {
                println!("{} {}", format!("[#{}]=", i).green(), value.repr());
            }
        }
    }
}

// REPL
fn repl(interp: &Interpreter, ctx: &Rc<Context>, cli: &Cli) -> Result<(), CliError> {
    println!("\n{} mode started", "Interactive".yellow().bold());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();

    loop {
        input.clear();
        print!("\n> ");
        stdout.flush()?;

        // End of input
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(());
        }

        let line = input.trim();
        if line == "quit" {
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        match run_unit(interp, ctx, line, "<stdin>", cli.ast) {
            Ok(values) => echo(&values),
            Err(e) => eprintln!("{e}"),
        }
    }
}

fn run(cli: Cli) -> Result<bool, CliError> {
    let config = load_config(&cli)?;

    println!(
        "\n       --- {} language v{} ---",
        "Yan".cyan().bold(),
        config.version
    );

    let interp = Interpreter::new(config);
    let ctx = interp.global_context("<program>");

    let args = cli.args.iter().map(|a| Value::string(a)).collect();
    ctx.declare("args", Value::new_list(args));

    let Some(file) = cli.file.clone() else {
        repl(&interp, &ctx, &cli)?;
        return Ok(true);
    };

    println!("\nReading source file {}...", file.display().to_string().green());
    let succeeded = interpret_file(&interp, &ctx, &file, &cli)?;

    if cli.interactive {
        repl(&interp, &ctx, &cli)?;
        return Ok(true);
    }

    Ok(succeeded)
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(args: &[&str]) -> Result<Config, CliError> {
        let cli = Cli::try_parse_from(
            ["yan", "--config", "no/such/env.def"].iter().chain(args.iter()),
        )
        .unwrap();
        load_config(&cli)
    }

    #[test]
    fn max_depth_flag_overrides_the_default() {
        let config = config_for(&["--max-depth", "64"]).unwrap();

        assert_eq!(config.max_call_depth, 64);
    }

    #[test]
    fn max_depth_flag_is_bounded() {
        let limit = MAX_CALL_DEPTH_LIMIT.to_string();
        assert_eq!(config_for(&["--max-depth", &limit]).unwrap().max_call_depth, MAX_CALL_DEPTH_LIMIT);

        let too_deep = (MAX_CALL_DEPTH_LIMIT + 1).to_string();
        assert!(matches!(
            config_for(&["--max-depth", &too_deep]),
            Err(CliError::InvalidDepth(depth)) if depth == MAX_CALL_DEPTH_LIMIT + 1
        ));
        assert!(matches!(config_for(&["--max-depth", "0"]), Err(CliError::InvalidDepth(0))));
    }
}
