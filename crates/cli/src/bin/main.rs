//! The command-line entry point of the storefront planner.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use storefront_planner_cli::{run, Command, Context};
use storefront_planner_configuration::environment::ProcessEnvironment;

/// Compile untrusted query plans into safe, read-only SQL against the storefront database.
#[derive(Debug, Parser)]
#[command(name = "storefront-planner", version)]
struct Args {
    /// The configuration directory.
    #[arg(long, env = "STOREFRONT_CONFIGURATION_DIR", default_value = ".")]
    context: PathBuf,

    /// Log filter, e.g. `info` or `query_engine_translation=debug`.
    #[arg(long, env = "STOREFRONT_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(filter: &str) -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("unable to initialize logging: {err}"))
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = init_logging(&args.log) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    let context = Context {
        context_path: args.context,
        environment: ProcessEnvironment,
    };
    let result = run(args.command, context, &mut std::io::stdout()).await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
