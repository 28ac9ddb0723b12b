//! # hyperrobot-cli
//!
//! Binary entry point for the Hyperrobot bot.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - Configuration loading and validation
//! - A console chat transport driving the dispatcher (`hyperrobot run`)
//! - One-off puzzle generation for checking the generator (`hyperrobot generate`)

mod console;
mod present;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::{ConsoleOutbox, run_console};
use hyperrobot_adapters::GeneratorSource;
use hyperrobot_core::{DispatchSettings, Dispatcher, HyperrobotConfig, format_moves};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Hyperrobot - ricochet robots puzzles for chat channels
#[derive(Parser, Debug)]
#[command(name = "hyperrobot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "hyperrobot.yml", global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play in the terminal: stdin lines are chat messages
    Run(RunArgs),

    /// Ask the generator for one puzzle and print it
    Generate(GenerateArgs),

    /// Validate the configuration file
    CheckConfig,
}

/// Arguments for the run subcommand.
#[derive(Parser, Debug)]
struct RunArgs {
    /// Speaker for lines without a `name: ` prefix
    #[arg(short, long, default_value = "you")]
    user: String,
}

/// Difficulty preset for the generate subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Baby,
    Super,
    Hyper,
}

impl From<DifficultyArg> for hyperrobot_core::Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Baby => Self::Baby,
            DifficultyArg::Super => Self::Super,
            DifficultyArg::Hyper => Self::Hyper,
        }
    }
}

/// Arguments for the generate subcommand.
#[derive(Parser, Debug)]
struct GenerateArgs {
    #[arg(value_enum, default_value_t = DifficultyArg::Baby)]
    difficulty: DifficultyArg,

    /// Search depth (defaults to max_depth from the configuration)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Print the puzzle as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Chat output owns stdout; logs go to stderr.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run_command(&cli.config, args).await,
        Commands::Generate(args) => generate_command(&cli.config, args).await,
        Commands::CheckConfig => check_config_command(&cli.config),
    }
}

fn load_config(path: &Path) -> Result<HyperrobotConfig> {
    let config = HyperrobotConfig::load_or_default(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let warnings = config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    for warning in &warnings {
        warn!("{}", warning);
    }
    Ok(config)
}

async fn run_command(config_path: &Path, args: RunArgs) -> Result<()> {
    let config = load_config(config_path)?;
    info!(
        channel = %config.channel,
        generator = %config.generator.command,
        "Starting hyperrobot"
    );

    let dispatcher = Dispatcher::new(
        DispatchSettings::from(&config),
        Arc::new(GeneratorSource::from_config(&config.generator)),
        Arc::new(ConsoleOutbox::new(&config.bot)),
    );
    run_console(dispatcher, &args.user)
        .await
        .context("Console transport failed")?;
    info!("Input closed, shutting down");
    Ok(())
}

async fn generate_command(config_path: &Path, args: GenerateArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let depth = args
        .depth
        .unwrap_or(config.max_depth)
        .clamp(1, config.max_depth);
    let spec = hyperrobot_core::Difficulty::from(args.difficulty).spec(depth);

    let source = GeneratorSource::from_config(&config.generator);
    let puzzle = source
        .run(spec)
        .await
        .with_context(|| format!("Generator `{}` failed", config.generator.command))?;

    if args.json {
        let value = serde_json::json!({
            "spec": spec,
            "goal": puzzle.board.goal(),
            "robots": puzzle.board.robots(),
            "walls": puzzle.board.walls(),
            "answer": puzzle.answer,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}手詰めです", puzzle.answer_len());
        print!("{}", present::render_board(&puzzle.board));
        println!("{}", format_moves(&puzzle.answer));
    }
    Ok(())
}

fn check_config_command(config_path: &Path) -> Result<()> {
    let config = HyperrobotConfig::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let warnings = config.validate()?;
    for warning in &warnings {
        println!("{warning}");
    }
    println!(
        "{}: OK ({} warning{})",
        config_path.display(),
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" }
    );
    Ok(())
}
