use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mql::{
    CompilerConfig, ExecutionContext, Features, Provider, Schema, assess, compile, execute,
    printer,
    providers::{MockProvider, Recorder, Recording},
};

#[derive(Parser, Debug)]
#[command(name = "mql", about = "Compile and run MQL queries against recorded resources")]
struct Cli {
    /// JSON schema of the available resources
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// TOML mock data set to run against
    #[arg(long, global = true)]
    mock: Option<PathBuf>,

    /// Comma separated feature flags (watch, trace); defaults to MQL_FEATURES
    #[arg(long, global = true)]
    features: Option<String>,

    /// Store everything the provider answered as a JSON recording
    #[arg(long, global = true)]
    record: Option<PathBuf>,

    /// Asset name used in recordings
    #[arg(long, global = true, default_value = "local")]
    asset: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a query and print its results
    Run {
        query: String,
        /// Print raw results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Execute a query and print its assessment
    Assess { query: String },
    /// Print the compiled code bundle
    Dump { query: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let features = match &cli.features {
        Some(list) => Features::parse(list)?,
        None => Features::from_env()?,
    };
    let schema = match &cli.schema {
        Some(path) => Schema::load(path)
            .with_context(|| format!("loading schema {}", path.display()))?,
        None => bail!("--schema is required"),
    };
    let config = CompilerConfig::new(features.clone());

    let query = match &cli.command {
        Command::Run { query, .. } | Command::Assess { query } | Command::Dump { query } => query,
    };
    let bundle = compile(query, &schema, &config)?;
    if let Command::Dump { .. } = cli.command {
        print!("{}", printer::code_bundle(&bundle));
        return Ok(ExitCode::SUCCESS);
    }

    let Some(mock) = &cli.mock else {
        bail!("--mock is required to execute queries");
    };
    let provider = MockProvider::load(schema, mock)
        .with_context(|| format!("loading mock data {}", mock.display()))?;
    let recorder = Arc::new(Recorder::new(provider, cli.asset.clone()));
    let context = ExecutionContext::new(
        Arc::clone(&recorder) as Arc<dyn Provider>,
        features,
    )
    .named(cli.asset.clone());

    let execution = execute(&bundle, &context)?;
    if let Some(path) = &cli.record {
        let mut recording = Recording::default();
        recording.push(recorder.recorded());
        recording.save(path)?;
    }

    match cli.command {
        Command::Run { json: true, .. } => {
            println!("{}", serde_json::to_string_pretty(&execution)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { .. } => {
            println!("{}", printer::results(&bundle, &execution));
            Ok(ExitCode::SUCCESS)
        }
        _ => match assess(&bundle, &execution) {
            Some(assessment) => {
                print!("{}", printer::assessment(&assessment));
                Ok(if assessment.success {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
            None => {
                println!("{}", printer::results(&bundle, &execution));
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}
