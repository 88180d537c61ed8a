//! wbwrap CLI - inspect, render and run wrapped Workbench commands

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use wbwrap::config::CONFIG_FILE;
use wbwrap::spec::DefaultPolicy;
use wbwrap::{Executor, FieldKind, FixSuggestion, Job, Registry, ToolConfig, WbError};

#[derive(Parser)]
#[command(name = "wbwrap")]
#[command(about = "Declarative wrappers for Connectome Workbench commands")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./wbwrap.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory for relative paths and the child process
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    /// Kill the tool after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered commands
    List,

    /// Show the fields and outputs of one command
    Describe {
        /// Registry name, e.g. cifti-dilate
        command: String,
    },

    /// Validate a job file and print the command line it renders to
    Cmdline {
        /// Path to a job YAML file
        job: PathBuf,
    },

    /// Validate and run a job file
    Run {
        /// Path to a job YAML file
        job: PathBuf,

        /// Print outputs as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.downcast_ref::<WbError>().and_then(|w| w.fix_suggestion()) {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cli: Cli) -> Result<()> {
    let registry = Registry::builtin()?;

    match &cli.command {
        Commands::List => list(&registry),
        Commands::Describe { command } => describe(&registry, command),
        Commands::Cmdline { job } => {
            let executor = executor(&cli)?;
            let invocation = load_job(job)?.into_invocation(&registry)?;
            println!("{}", executor.command(&invocation)?);
            Ok(())
        }
        Commands::Run { job, json } => {
            let executor = executor(&cli)?;
            let mut invocation = load_job(job)?.into_invocation(&registry)?;
            executor.prepare(&mut invocation)?;
            let outputs = executor.run(&invocation)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&outputs)?);
            } else {
                println!("{} {}", "✓".green(), invocation.spec().name.bold());
                for (name, path) in outputs.iter() {
                    println!("  {}: {}", name.cyan(), path.display());
                }
            }
            Ok(())
        }
    }
}

fn load_job(path: &Path) -> Result<Job> {
    Job::load(path).with_context(|| format!("Failed to load job '{}'", path.display()))
}

/// Merge flags over the config file over the environment
fn executor(cli: &Cli) -> Result<Executor> {
    let config = match &cli.config {
        Some(path) => ToolConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None if Path::new(CONFIG_FILE).is_file() => ToolConfig::load(CONFIG_FILE)
            .with_context(|| format!("Failed to load config '{}'", CONFIG_FILE))?,
        None => ToolConfig::default(),
    }
    .with_env();

    let mut executor = Executor::from_config(&config);
    if let Some(dir) = &cli.workdir {
        executor = executor.with_working_dir(dir);
    }
    if let Some(secs) = cli.timeout {
        executor = executor.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    Ok(executor)
}

fn list(registry: &Registry) -> Result<()> {
    for spec in registry.iter() {
        println!("{:<36} {}", spec.name.cyan().bold(), spec.desc);
    }
    Ok(())
}

fn describe(registry: &Registry, name: &str) -> Result<()> {
    let spec = registry.get(name)?;
    println!("{} {}", spec.name.cyan().bold(), spec.desc);
    println!("  {} {}", "Runs:".bold(), spec.prefix);
    println!("{}", "Inputs:".bold());
    for field in spec.inputs {
        let position = field
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut notes = Vec::new();
        if field.mandatory {
            notes.push("mandatory".to_string());
        }
        match field.default {
            DefaultPolicy::None => {}
            DefaultPolicy::Literal(literal) => notes.push(format!("default {}", literal.to_value())),
            DefaultPolicy::Derived(naming) => notes.push(format!("named from {}", naming.source)),
        }
        if field.auxiliary {
            notes.push("setup only".to_string());
        }
        if !field.requires.is_empty() {
            notes.push(format!("requires {}", field.requires.join(", ")));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join("; "))
        };
        let template = match field.kind {
            FieldKind::Flag { flag } => flag,
            FieldKind::StructureGroups { group, .. } => group,
            kind => kind.argstr().unwrap_or(""),
        };
        println!(
            "  {:>3} {:<28} {:<18} {:<22} {}{}",
            position,
            field.name.green(),
            field.kind.type_name(),
            template,
            field.desc,
            notes.dimmed()
        );
    }
    if !spec.outputs.is_empty() {
        println!("{}", "Outputs:".bold());
        for output in spec.outputs {
            println!("      {:<28} {}", output.name.green(), output.desc);
        }
    }
    Ok(())
}
