//! The CLI can do a few things. This provides a central point where those things are routed and
//! then done, making it easier to test this crate deterministically.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Subcommand;
use serde_json::json;

use query_engine_metadata::metadata;
use query_engine_translation::translation::helpers::Catalog;
use storefront_planner::{query, PlannerSetup};
use storefront_planner_configuration as configuration;
use storefront_planner_configuration::environment::Environment;

/// The various contextual bits and bobs we need to run.
pub struct Context<Env: Environment> {
    /// The configuration directory.
    pub context_path: PathBuf,
    /// Where secrets such as the connection URI are read from.
    pub environment: Env,
}

/// The command invoked by the user.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write the initial configuration, with the storefront contract, to the configuration
    /// directory.
    Initialize {
        /// Overwrite an existing configuration.
        #[arg(long)]
        force: bool,
    },
    /// Print the schema description handed to the upstream planner.
    Describe,
    /// Validate a plan and print the statement it compiles to, without touching the database.
    Compile {
        /// A file holding the JSON plan. Read from standard input when omitted.
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Answer planner output: chat messages pass through, plans run against the database.
    Query {
        /// A file holding the planner output. Read from standard input when omitted.
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Print the database's execution plan for a plan.
    Explain {
        /// A file holding the JSON plan. Read from standard input when omitted.
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file.
    PrintSchema,
}

/// Run a command in a given directory.
pub async fn run(
    command: Command,
    context: Context<impl Environment>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Initialize { force } => initialize(&context, force).await?,
        Command::Describe => describe(&context, out).await?,
        Command::Compile { plan } => compile(&context, plan.as_deref(), out).await?,
        Command::Query { plan } => run_query(context, plan.as_deref(), out).await?,
        Command::Explain { plan } => explain(context, plan.as_deref(), out).await?,
        Command::PrintSchema => print_schema(out)?,
    };
    Ok(())
}

/// Initialize an empty directory with the initial configuration.
///
/// Fails when a configuration already exists, unless `force` is set.
async fn initialize(context: &Context<impl Environment>, force: bool) -> anyhow::Result<()> {
    let configuration_file = context
        .context_path
        .join(configuration::version1::CONFIGURATION_FILENAME);
    if !force && tokio::fs::try_exists(&configuration_file).await? {
        anyhow::bail!(
            "a configuration already exists at {}; use --force to overwrite it",
            configuration_file.display()
        );
    }

    configuration::write_parsed_configuration(
        configuration::ParsedConfiguration::initial(),
        &context.context_path,
    )
    .await?;
    tracing::info!(path = %context.context_path.display(), "wrote initial configuration");
    Ok(())
}

/// Print the schema description of the configured contract.
async fn describe(
    context: &Context<impl Environment>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let contract = read_contract(&context.context_path).await?;
    write!(out, "{}", metadata::describe(&contract))?;
    Ok(())
}

/// Print the validated plan and its statement.
async fn compile(
    context: &Context<impl Environment>,
    plan: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let catalog = Catalog::new(read_contract(&context.context_path).await?);
    let plan: serde_json::Value =
        serde_json::from_str(&read_input(plan)?).context("the plan is not valid JSON")?;

    let compiled = query::compile_json(&catalog, plan)?;
    let output = json!({
        "plan": compiled.plan,
        "sql": compiled.execution_plan.query_sql(),
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

async fn run_query(
    context: Context<impl Environment>,
    plan: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let input = read_input(plan)?;
    let planner = PlannerSetup::new(context.environment)
        .build(&context.context_path, &mut prometheus::Registry::new())
        .await?;

    let answer = planner.answer(&input).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&answer)?)?;
    Ok(())
}

async fn explain(
    context: Context<impl Environment>,
    plan: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let plan: serde_json::Value =
        serde_json::from_str(&read_input(plan)?).context("the plan is not valid JSON")?;
    let planner = PlannerSetup::new(context.environment)
        .build(&context.context_path, &mut prometheus::Registry::new())
        .await?;

    let response = planner.explain(plan).await?;
    for (title, detail) in &response.details {
        writeln!(out, "{title}:\n{detail}\n")?;
    }
    Ok(())
}

fn print_schema(out: &mut impl Write) -> anyhow::Result<()> {
    let schema = schemars::schema_for!(configuration::ParsedConfiguration);
    writeln!(out, "{}", serde_json::to_string_pretty(&schema)?)?;
    Ok(())
}

/// The contract of the configuration in `context_path`, checked for consistency. Secrets are
/// not resolved.
async fn read_contract(context_path: &Path) -> anyhow::Result<metadata::Contract> {
    let parsed = configuration::parse_configuration(context_path).await?;
    parsed.contract.check()?;
    Ok(parsed.contract)
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
