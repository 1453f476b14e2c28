//! # DockMock Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The `dockmock` binary. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the `serve` and `fixtures` handlers
//!
//! ## Examples
//!
//! ```bash
//! # Serve a mock daemon with fixtures, logging requests
//! dockmock -v serve --fixtures ./fixtures
//!
//! # Check what a fixture directory provides
//! dockmock fixtures ./fixtures
//! ```
//!
use clap::Parser;
use dockmock::commands;
use tracing_subscriber::{fmt, EnvFilter};

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "dockmock",
    about = "🐳 DockMock: an in-process Docker Engine API double",
    long_about = "Serve a fake Docker daemon backed by fixtures, for deterministic,\n\
                  network-free tests of Docker client code.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Expose a fresh engine over HTTP.
    #[command(alias = "s")]
    Serve(commands::serve::ServeArgs),
    /// List the fixtures a directory registers.
    #[command(alias = "f")]
    Fixtures(commands::fixtures::FixturesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Serve(args) => commands::serve::handle_serve(args).await,
        Commands::Fixtures(args) => commands::fixtures::handle_fixtures(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
