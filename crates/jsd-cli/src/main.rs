//! # jsd CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// jsd — declarative JSON Schema generation.
///
/// Compiles object definition documents to draft-4 JSON Schema and
/// validates documents against them.
#[derive(Parser, Debug)]
#[command(name = "jsd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compile an object to a JSON Schema document.
    Compile(jsd_cli::compile::CompileArgs),
    /// Validate documents against an object's schema.
    Validate(jsd_cli::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile(args) => jsd_cli::compile::run(&args),
        Commands::Validate(args) => jsd_cli::validate::run(&args),
    }
}
