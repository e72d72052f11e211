//! # Validate Subcommand
//!
//! Validates JSON/YAML documents against one object of a definition
//! document.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use jsd_schema::{SchemaRegistry, SchemaValidationError, SchemaValidator};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Definition document (YAML, or JSON with a `.json` extension).
    #[arg(long, short)]
    pub definitions: PathBuf,

    /// Object to use as the schema root.
    #[arg(long)]
    pub root: String,

    /// Reject `null` at the root.
    #[arg(long)]
    pub required: bool,

    /// Documents to validate (`.yaml`/`.yml` are YAML, anything else JSON).
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

/// Validate every document; returns the number that failed.
pub fn check(args: &ValidateArgs) -> anyhow::Result<usize> {
    let registry = SchemaRegistry::load(&args.definitions)
        .with_context(|| format!("loading {}", args.definitions.display()))?;
    let validator = SchemaValidator::from_registry(&registry, &args.root, args.required)?;

    let mut failed = 0usize;
    for document in &args.documents {
        match validator.validate_file(document) {
            Ok(()) => {
                tracing::info!(document = %document.display(), "valid");
                println!("ok      {}", document.display());
            }
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
                failed += 1;
                println!("invalid {}", document.display());
                println!("{violations}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(failed)
}

/// Run the validate subcommand; fails if any document is invalid.
pub fn run(args: &ValidateArgs) -> anyhow::Result<()> {
    let failed = check(args)?;
    if failed > 0 {
        anyhow::bail!(
            "{failed} of {} documents failed validation against '{}'",
            args.documents.len(),
            args.root
        );
    }
    Ok(())
}
