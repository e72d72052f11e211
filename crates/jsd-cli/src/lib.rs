//! # jsd-cli — jsd Command-Line Interface
//!
//! ## Subcommands
//!
//! - `compile` — compile an object from a definition document to JSON Schema
//! - `validate` — validate documents against an object's compiled schema
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; schema work is delegated to `jsd-schema`.

pub mod compile;
pub mod validate;
