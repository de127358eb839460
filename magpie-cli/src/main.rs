//! Magpie CLI - Command line interface for the Magpie review service
//!
//! Automated pull-request review: static rules, complexity-routed AI
//! review, and idempotent comment posting.

mod commands;

use clap::{Parser, Subcommand};
use magpie_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ReviewArgs, WorkerArgs};

/// Magpie: automated pull-request review
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository to review, as owner/name (overrides config and env)
    #[arg(long, global = true, env = "MAGPIE_REPOSITORY")]
    repository: Option<String>,

    /// Model override as provider:model (overrides complexity routing)
    #[arg(long, global = true, env = "MAGPIE_MODEL")]
    model: Option<String>,

    /// Plan tier to enforce (free, pro, enterprise)
    #[arg(long, global = true, env = "MAGPIE_PLAN")]
    plan: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Review one pull request
    #[command(visible_alias = "r")]
    Review(ReviewArgs),

    /// Run the worker pool, reading jobs from stdin
    Worker(WorkerArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(
        cli.repository.clone(),
        cli.model.clone(),
        cli.plan.clone(),
    )?;

    match cli.command {
        Some(Commands::Version) => {
            println!("magpie {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Review(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Worker(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Config) => {
            println!("Magpie Configuration");
            println!("====================");
            println!();
            print!("{}", config.redacted_summary());
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Magpie - automated pull-request review");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
