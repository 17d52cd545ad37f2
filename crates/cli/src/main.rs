//! `doctest` — evaluate executable comments and record their results.
//!
//! Batch mode rewrites annotations in place:
//!
//! ```text
//! doctest run src/
//! ```
//!
//! Serve mode speaks the interactive JSON-lines protocol over stdio for
//! editor hosts:
//!
//! ```text
//! doctest serve
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use doctest_engine::EvaluationCoordinator;
use doctest_eval::{CommandEvaluator, Evaluator, MiniInterpreter};
use doctest_server::Service;
use std::path::PathBuf;
use std::sync::Arc;

mod discover;
mod report;

#[derive(Parser)]
#[command(name = "doctest")]
#[command(about = "Evaluate executable comments and record their results", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Evaluator backend
    #[arg(long, global = true, value_enum, default_value_t = EvaluatorKind::Mini)]
    evaluator: EvaluatorKind,

    /// External REPL command (required with --evaluator command)
    #[arg(long, global = true)]
    eval_command: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Batch-evaluate directives in files or directories and rewrite their annotations
    Run(RunArgs),

    /// Serve the interactive protocol over stdio
    Serve,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Files or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Emit the report as JSON instead of the human summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EvaluatorKind {
    /// Built-in tree-walking interpreter
    Mini,
    /// External REPL subprocess
    Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr only; in serve mode stdout carries protocol
    // JSON, and in run mode it carries the report.
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let evaluator = build_evaluator(&cli)?;
    match cli.command {
        Commands::Run(args) => run_batch(evaluator, args).await,
        Commands::Serve => {
            log::info!("serving interactive protocol on stdio");
            Service::new(evaluator).serve_stdio().await
        }
    }
}

fn build_evaluator(cli: &Cli) -> Result<Arc<dyn Evaluator>> {
    match cli.evaluator {
        EvaluatorKind::Mini => Ok(Arc::new(MiniInterpreter::new())),
        EvaluatorKind::Command => {
            let Some(command) = &cli.eval_command else {
                bail!("--evaluator command requires --eval-command");
            };
            let mut parts = command.split_whitespace().map(str::to_string);
            let Some(program) = parts.next() else {
                bail!("--eval-command is empty");
            };
            Ok(Arc::new(CommandEvaluator::new(program, parts.collect())))
        }
    }
}

async fn run_batch(evaluator: Arc<dyn Evaluator>, args: RunArgs) -> Result<()> {
    let files = discover::discover(&args.paths);
    if files.is_empty() {
        bail!("no supported source files under the given paths");
    }

    let coordinator = EvaluationCoordinator::new(evaluator);
    let report = coordinator.run_batch(files).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print(&report);
    }

    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
