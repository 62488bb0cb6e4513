//! minicrew command-line runner.
//!
//! Loads a crew definition (YAML), wires the built-in tools and the
//! configured LLMs, and runs it.
//!
//! # Environment Variables
//!
//! - `MINICREW_MODEL`: default model (default: `ollama/tinyllama`)
//! - `OLLAMA_BASE_URL`, `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `SERPER_API_KEY`
//! - `RUST_LOG`: tracing filter (default: `info,minicrew=debug`)
//!
//! # Usage
//!
//! ```bash
//! minicrew run demos/venue_finder.yaml --input conference_name="RustConf"
//! minicrew validate demos/research_report.yaml --input topic="AI in healthcare"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use minicrew::config::Settings;
use minicrew::project::CrewDefinition;
use minicrew::{Process, ToolAdapter};

#[derive(Debug, Parser)]
#[command(name = "minicrew", version, about = "Run a crew of role-playing agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a crew definition and print the final output")]
    Run {
        /// Crew definition file (YAML).
        file: PathBuf,
        /// Run input as key=value; repeatable.
        #[arg(long = "input", short = 'i', value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
        /// Override the process from the definition.
        #[arg(long)]
        process: Option<Process>,
        /// Echo agent steps to stdout.
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    #[command(about = "Validate a crew definition and its inputs without running it")]
    Validate {
        file: PathBuf,
        #[arg(long = "input", short = 'i', value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
        #[arg(long)]
        process: Option<Process>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid input '{}': expected key=value", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid input '{}': empty key", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn load(
    file: &Path,
    process: Option<Process>,
    verbose: bool,
    inputs: Vec<(String, String)>,
) -> anyhow::Result<(minicrew::Crew, HashMap<String, String>)> {
    let settings = Settings::load();
    let mut definition = CrewDefinition::load(file)?;
    if let Some(process) = process {
        definition.process = process;
    }
    definition.verbose |= verbose;
    let inputs = definition.inputs_with(inputs.into_iter().collect());
    let tools = ToolAdapter::with_default_tools(&settings);
    let crew = definition
        .build(&settings, tools)
        .with_context(|| format!("failed to build crew from {}", file.display()))?;
    Ok((crew, inputs))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,minicrew=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            file,
            inputs,
            process,
        } => {
            let (crew, inputs) = load(&file, process, false, inputs)?;
            let tasks = crew.validate(&inputs)?;
            tracing::info!("{} is valid", file.display());
            println!("{} ({} task(s))", crew, tasks.len());
            for (i, task) in tasks.iter().enumerate() {
                println!("{}. {}", i + 1, task.label());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            file,
            inputs,
            process,
            verbose,
        } => {
            let (crew, inputs) = load(&file, process, verbose, inputs)?;
            match crew.kickoff(inputs).await {
                Ok(output) => {
                    tracing::info!(
                        "Crew finished: {} task(s), {} total tokens",
                        output.len(),
                        output.token_usage.total_tokens
                    );
                    println!("{}", output.finalize());
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    eprintln!("Error: {}", err);
                    for (i, output) in err.completed.iter().enumerate() {
                        eprintln!(
                            "\n--- Task {} completed by {} ---\n{}",
                            i + 1,
                            output.agent,
                            output.raw
                        );
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
