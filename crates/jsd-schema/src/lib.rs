//! # jsd-schema — Definition Documents & Validation
//!
//! The data-driven side of jsd.
//!
//! ## Definition Documents (`document`)
//!
//! Object schemas declared in YAML or JSON and harvested once into a
//! [`SchemaRegistry`]. Key functions:
//!
//! - [`SchemaRegistry::load`] — read and resolve a document file.
//! - [`SchemaRegistry::compile`] — compile a named object as a schema root.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator`] pairs a compiled schema with a Draft 4 validator from
//! the `jsonschema` crate and reports failures as [`Violation`]s.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsd-core` internally.
//! - Never validates data itself; the `jsonschema` engine does.

pub mod document;
pub mod validate;

pub use document::{
    DefinitionDocument, DocumentError, FieldSpec, ObjectSpec, SchemaRegistry, TypeSpec,
};
pub use validate::{SchemaValidationError, SchemaValidator, ValidationViolations, Violation};
