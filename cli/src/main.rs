use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Result};
use thiserror::Error;
use tracing::debug;
use uplc::{
    Backend, BudgetPolicy, CostModelTable, EvalResult, ExBudget, LanguageVersion, MachineParams,
    Program, ProtocolVersion, compiler::JitCompiler, evaluate, parse_program, render_error,
};

/// UPLC - a deterministic evaluator for Untyped Plutus Core
#[derive(Parser, Debug)]
#[command(name = "uplc")]
#[command(about = "Evaluate Untyped Plutus Core programs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a program and print its result, budget and trace log
    Eval(EvalArgs),
    /// Convert a textual program to hex-encoded flat
    Encode {
        file: PathBuf,
    },
    /// Convert a hex-encoded flat program to text
    Decode {
        file: PathBuf,
    },
    /// Print the code the JIT compiler produces for a textual program
    Compile {
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct EvalArgs {
    /// Program file
    file: PathBuf,

    /// How the file is encoded
    #[arg(long, value_enum, default_value_t = InputFormat::Textual)]
    input: InputFormat,

    /// Machine to run on: cek, slots, boxed or hybrid
    #[arg(long, default_value = "cek")]
    backend: Backend,

    /// Budget limit as CPU,MEM (default: the per-transaction maximum)
    #[arg(long, value_parser = parse_budget, conflicts_with_all = ["counting", "unbudgeted"])]
    budget: Option<ExBudget>,

    /// Count the budget without a limit
    #[arg(long, conflicts_with = "unbudgeted")]
    counting: bool,

    /// Do not account costs at all
    #[arg(long)]
    unbudgeted: bool,

    /// Cost model table in JSON (default: the embedded table)
    #[arg(long)]
    cost_model: Option<PathBuf>,

    /// Protocol version used to pick the cost model, as MAJOR.MINOR
    /// (default: the newest entry)
    #[arg(long)]
    protocol: Option<ProtocolVersion>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InputFormat {
    Textual,
    Flat,
    Hex,
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(uplc::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(uplc::input))]
    Input(#[from] uplc::Error),

    #[error("cannot compile program: {0}")]
    #[diagnostic(code(uplc::compile))]
    Compile(String),
}

fn parse_budget(text: &str) -> Result<ExBudget, String> {
    let (cpu, mem) = text
        .split_once(',')
        .ok_or_else(|| format!("expected CPU,MEM but got `{text}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i64>()
            .ok()
            .filter(|value| *value >= 0)
            .ok_or_else(|| format!("invalid budget component `{part}`"))
    };
    Ok(ExBudget::new(parse(mem)?, parse(cpu)?))
}

fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a textual program, rendering any error against its source.
fn parse_source(path: &Path) -> Result<Option<Program>, CliError> {
    let source = read_text(path)?;
    match parse_program(&source) {
        Ok(program) => Ok(Some(program)),
        Err(error) => {
            render_error(&error.into(), &source);
            Ok(None)
        }
    }
}

fn load_program(args: &EvalArgs) -> Result<Option<Program>, CliError> {
    let program = match args.input {
        InputFormat::Textual => return parse_source(&args.file),
        InputFormat::Flat => Program::from_flat(&read_bytes(&args.file)?),
        InputFormat::Hex => Program::from_hex(read_text(&args.file)?.trim()),
    };
    program
        .map(Some)
        .map_err(|error| CliError::Input(error.into()))
}

fn load_params(args: &EvalArgs) -> Result<MachineParams, CliError> {
    let table = match &args.cost_model {
        Some(path) => CostModelTable::from_json(&read_text(path)?),
        None => CostModelTable::embedded(),
    }
    .map_err(|error| CliError::Input(error.into()))?;

    let params = match args.protocol {
        Some(protocol) => table.lookup(protocol, LanguageVersion::PlutusV3),
        None => table.latest(LanguageVersion::PlutusV3),
    }
    .map_err(|error| CliError::Input(error.into()))?;
    Ok(params.clone())
}

fn policy(args: &EvalArgs) -> BudgetPolicy {
    if args.unbudgeted {
        BudgetPolicy::Unbudgeted
    } else if args.counting {
        BudgetPolicy::Counting
    } else {
        BudgetPolicy::Restricting(args.budget.unwrap_or(ExBudget::MAX_TX))
    }
}

fn print_result(result: &EvalResult) {
    match result {
        EvalResult::Success { term, .. } => println!("{term}"),
        EvalResult::Failure { kind, error, .. } => println!("evaluation failure ({kind}): {error}"),
    }
    println!("budget: {}", result.budget());
    for log in result.logs() {
        println!("log: {log}");
    }
}

fn run_eval(args: &EvalArgs) -> Result<ExitCode, CliError> {
    let Some(program) = load_program(args)? else {
        return Ok(ExitCode::FAILURE);
    };
    let params = load_params(args)?;
    let policy = policy(args);
    debug!(backend = %args.backend, ?policy, "Evaluating {}", args.file.display());

    let result = evaluate(&program, &params, policy, args.backend);
    print_result(&result);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(command: Command) -> Result<ExitCode, CliError> {
    match command {
        Command::Eval(args) => run_eval(&args),
        Command::Encode { file } => {
            let Some(program) = parse_source(&file)? else {
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", program.to_hex());
            Ok(ExitCode::SUCCESS)
        }
        Command::Decode { file } => {
            let program = Program::from_hex(read_text(&file)?.trim())
                .map_err(|error| CliError::Input(error.into()))?;
            println!("{program}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Compile { file } => {
            let Some(program) = parse_source(&file)? else {
                return Ok(ExitCode::FAILURE);
            };
            let code = JitCompiler::compile(&program.term)
                .map_err(|error| CliError::Compile(error.to_string()))?;
            println!("{code:?}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    // RUST_LOG controls the log level; default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(run(args.command)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("100,20"), Ok(ExBudget::new(20, 100)));
        assert_eq!(parse_budget(" 7 , 8 "), Ok(ExBudget::new(8, 7)));
        assert!(parse_budget("100").is_err());
        assert!(parse_budget("-1,5").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "uplc",
            "eval",
            "prog.uplc",
            "--backend",
            "hybrid",
            "--budget",
            "1000,10",
        ]);
        let Command::Eval(eval) = args.command else {
            panic!("expected eval");
        };
        assert_eq!(eval.input, InputFormat::Textual);
        assert_eq!(eval.backend.name(), "hybrid");
        assert_eq!(policy(&eval), BudgetPolicy::Restricting(ExBudget::new(10, 1000)));
    }

    #[test]
    fn test_conflicting_policies_are_rejected() {
        let parsed = Args::try_parse_from(["uplc", "eval", "p.uplc", "--counting", "--unbudgeted"]);
        assert!(parsed.is_err());
    }
}
