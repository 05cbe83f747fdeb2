//! Templatamus — keep generated projects in sync with their template repository.
//!
//! # Usage
//!
//! ```text
//! templatamus [sync] [--dir PATH] [--allow-dirty] [--resolved | --skip]
//! templatamus status [--dir PATH] [--json]
//! templatamus log [--dir PATH] [--pending]
//! templatamus init [PATH] [--repo OWNER/NAME] [--branch B | --tag T] [--commit SHA] [--git]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, log::LogArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templatamus",
    version,
    about = "Apply upstream template commits to projects generated from them",
    long_about = "Apply upstream template commits to projects generated from them.\n\n\
                  Runs against one project directory at a time. Running two syncs \
                  against the same project concurrently is not supported."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select upstream commits and apply them to the project (default).
    Sync(SyncArgs),

    /// Show provenance and sync state of a project.
    Status(StatusArgs),

    /// List upstream commits and whether they are applied.
    Log(LogArgs),

    /// Start tracking an existing directory generated from a template.
    Init(InitArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command.unwrap_or_else(|| Commands::Sync(SyncArgs::default())) {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Log(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}

/// Logs go to stderr; `log` records from the library crates are bridged in.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
