use anyhow::{Context as _, Result};
use genemu_suite::{Manifest, Suite};
use genemu_test_runner::{
    EngineInvoker, ExecutionPool,
    cli::{Cli, RUNNER_BIN, clap::Parser as _},
    logging, run_suite,
};
use std::process::ExitCode;

fn load_suite(cli: &Cli) -> Result<Suite> {
    match cli.suite() {
        Some(path) => Suite::load(path)
            .with_context(|| format!("Failed to load suite: {}", path.display())),
        None => Suite::builtin().context("Invalid built-in suite"),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let suite = load_suite(cli)?;

    if cli.list() {
        println!("{}", Manifest::build(&suite).to_json_pretty()?);
        return Ok(());
    }

    let pool = cli
        .jobs()
        .map_or_else(ExecutionPool::with_available_parallelism, ExecutionPool::new);
    let invoker = EngineInvoker::new(cli.engine())
        .with_suppress_stdout(cli.suppress_engine_output())
        .with_timeout(cli.timeout());

    let report = run_suite(&suite, cli.manifest(), &pool, &invoker)?;

    tracing::info!(
        completed = report.completed(),
        failed = report.failures().count(),
        elapsed_secs = report.elapsed().as_secs_f64(),
        "run finished"
    );

    report.into_result()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(cli.verbosity()) {
        eprintln!("{RUNNER_BIN}: {err:#}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{RUNNER_BIN}: error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
