//! # Compile Subcommand
//!
//! Compiles one object of a definition document into a JSON Schema document.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use jsd_schema::SchemaRegistry;

/// Arguments for the compile subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Definition document (YAML, or JSON with a `.json` extension).
    #[arg(long, short)]
    pub definitions: PathBuf,

    /// Object to use as the schema root.
    #[arg(long)]
    pub root: String,

    /// Reject `null` at the root.
    #[arg(long)]
    pub required: bool,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,

    /// Output file (stdout if omitted).
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Compile the root object and render it.
pub fn render(args: &CompileArgs) -> anyhow::Result<String> {
    let registry = SchemaRegistry::load(&args.definitions)
        .with_context(|| format!("loading {}", args.definitions.display()))?;
    let schema = registry.compile(&args.root, args.required)?;
    let rendered = if args.compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };
    Ok(rendered)
}

/// Run the compile subcommand.
pub fn run(args: &CompileArgs) -> anyhow::Result<()> {
    let rendered = render(args)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(root = %args.root, out = %path.display(), "schema written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
