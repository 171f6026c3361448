//! # depot CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// depot — package manifest tooling.
///
/// Validates package and platform manifests against the depot schema,
/// either rejecting on the first violation (strict) or repairing the
/// document by dropping offending entries (best-effort).
#[derive(Parser, Debug)]
#[command(name = "depot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a manifest file.
    Validate(depot_cli::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => depot_cli::validate::run(&args),
    }
}
