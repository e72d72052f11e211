//! # jsd-core — Declarative JSON Schema Generation
//!
//! Describes data shapes as a tree of typed nodes and compiles the tree into
//! a JSON Schema (draft 4) document for an external validator.
//!
//! ## Model
//!
//! - Scalars ([`StringType`], [`BooleanType`], [`IntegerType`],
//!   [`NumberType`]) emit a single `type` keyword.
//! - [`ArrayType`] adds `minItems` and, when it has an item type, `items`.
//! - [`ObjectType`] compiles a shared [`ObjectDefinition`] into
//!   `properties` and `required`.
//! - [`OneOfType`] compiles to `oneOf`.
//!
//! Optional nodes accept `null`: `{"type": [kind, "null"]}`. See [`types`]
//! for the one exception.
//!
//! ## Declaring Objects
//!
//! - Builder: [`ObjectDefinition::builder`], one chain per definition.
//! - Class-like: implement [`ObjectSchema`] on a marker type; fields are
//!   harvested once per type.
//!
//! Composition sites take anything implementing [`IntoType`], so a bare
//! [`Kind`] and a configured node are interchangeable there.
//!
//! ## Crate Policy
//!
//! - Compilation is pure and infallible; all errors are
//!   [`DefinitionError`]s raised while declaring.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod compile;
pub mod declare;
pub mod error;
pub mod normalize;
pub mod object;
pub mod types;

pub use compile::{compile, normalized};
pub use declare::{is_harvested, ObjectSchema};
pub use error::DefinitionError;
pub use normalize::{IntoType, Kind, TypeRef};
pub use object::{DefinitionBuilder, ObjectDefinition, ObjectType};
pub use types::{
    ArrayType, BooleanType, Compile, IntegerType, NumberType, OneOfType, StringType, Type,
};
