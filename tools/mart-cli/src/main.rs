//! Mart CLI - console storefront and companion bank.
//!
//! Commands:
//! - `mart init` - Create the store and load demo data
//! - `mart shop` - Interactive storefront session
//! - `mart bank` - Interactive banking session

mod commands;
mod config;
mod context;
mod output;
mod seed;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::InitArgs;

/// Mart - a console storefront with a companion bank
#[derive(Parser)]
#[command(name = "mart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store database and load demo data
    Init(InitArgs),

    /// Shop: browse, cart, checkout, orders, reviews
    Shop,

    /// Bank: accounts, deposits, statements, beneficiaries
    Bank,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let output = output::Output::new(cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output).await?;

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args, &ctx).await,
        Commands::Shop => commands::shop::run(&ctx).await,
        Commands::Bank => commands::bank::run(&ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
