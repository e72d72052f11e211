//! # Object Definitions
//!
//! An object schema has two layers:
//!
//! - [`ObjectDefinition`]: the harvested, immutable field set of a named
//!   composite (the "class"). Built once by [`DefinitionBuilder::build`] and
//!   shared through `Arc` by every instance that uses it.
//! - [`ObjectType`]: a use of a definition as a node, carrying its own
//!   `required` flag (the "instance").
//!
//! ## Harvesting
//!
//! `build()` is the single point where declared fields become the
//! definition's ordered field map. Inherited fields come first in parent
//! order; the definition's own fields follow, and an own field with a
//! parent's name replaces the parent's node in place. The required field
//! list is derived from the merged map in that same order.
//!
//! `additionalProperties` is part of the model (default `false`) but is not
//! emitted by [`Compile::compile`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::declare::ObjectSchema;
use crate::error::DefinitionError;
use crate::normalize::IntoType;
use crate::types::{type_keyword, Compile, Type};

/// The harvested field set of a named object schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    name: String,
    fields: IndexMap<String, Type>,
    required_field_names: Vec<String>,
    additional_properties: bool,
}

impl ObjectDefinition {
    /// Start declaring an object definition.
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name)
    }

    /// The object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &IndexMap<String, Type> {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.get(name)
    }

    /// Names of required fields, in declaration order.
    pub fn required_field_names(&self) -> &[String] {
        &self.required_field_names
    }

    /// Modelled but never emitted.
    pub fn additional_properties(&self) -> bool {
        self.additional_properties
    }

    /// Number of fields, inherited ones included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// An optional instance of this definition.
    pub fn instance(self: &Arc<Self>) -> ObjectType {
        ObjectType::new(Arc::clone(self))
    }
}

/// Collects field declarations for one object definition.
///
/// Field errors are recorded and surfaced by [`build`](Self::build), so a
/// declaration reads as one chain of calls.
#[derive(Debug)]
#[must_use]
pub struct DefinitionBuilder {
    name: String,
    parents: Vec<Arc<ObjectDefinition>>,
    declared: IndexMap<String, Type>,
    additional_properties: bool,
    error: Option<DefinitionError>,
}

impl DefinitionBuilder {
    /// Start an empty declaration named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            declared: IndexMap::new(),
            additional_properties: false,
            error: None,
        }
    }

    /// Declare a field. `ty` may be an instance or a bare descriptor.
    pub fn field(mut self, name: impl Into<String>, ty: impl IntoType) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = name.into();
        match ty.into_type() {
            Ok(_) if self.declared.contains_key(&name) => {
                self.error = Some(DefinitionError::DuplicateField {
                    object: self.name.clone(),
                    field: name,
                });
            }
            Ok(ty) => {
                self.declared.insert(name, ty);
            }
            Err(e) => {
                self.error = Some(e.at(format!("field '{}.{}'", self.name, name)));
            }
        }
        self
    }

    /// Inherit every field of `parent`.
    pub fn extends(mut self, parent: &Arc<ObjectDefinition>) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    /// Inherit every field of the trait-declared object `P`.
    pub fn inherit<P: ObjectSchema>(mut self) -> Self {
        if self.error.is_some() {
            return self;
        }
        match P::definition() {
            Ok(parent) => self.extends(&parent),
            Err(e) => {
                self.error = Some(e.at(format!("parent '{}' of '{}'", P::NAME, self.name)));
                self
            }
        }
    }

    /// Set the modelled `additionalProperties` flag.
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    /// Harvest the declarations into a definition.
    ///
    /// # Errors
    ///
    /// The first error recorded while declaring: a duplicate field name, or
    /// a field or parent that could not be materialized.
    pub fn build(self) -> Result<ObjectDefinition, DefinitionError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut fields = IndexMap::new();
        for parent in &self.parents {
            for (name, ty) in parent.fields() {
                fields.insert(name.clone(), ty.clone());
            }
        }
        for (name, ty) in self.declared {
            fields.insert(name, ty);
        }

        let required_field_names: Vec<String> = fields
            .iter()
            .filter(|(_, ty)| ty.is_required())
            .map(|(name, _)| name.clone())
            .collect();

        tracing::debug!(
            object = %self.name,
            fields = fields.len(),
            required = required_field_names.len(),
            parents = self.parents.len(),
            "harvested object definition"
        );

        Ok(ObjectDefinition {
            name: self.name,
            fields,
            required_field_names,
            additional_properties: self.additional_properties,
        })
    }
}

/// A node that uses an object definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    definition: Arc<ObjectDefinition>,
    required: bool,
}

impl ObjectType {
    /// JSON Schema primitive name emitted by this node.
    pub const KIND: &'static str = "object";

    /// An optional (nullable) instance of `definition`.
    pub fn new(definition: Arc<ObjectDefinition>) -> Self {
        Self {
            definition,
            required: false,
        }
    }

    /// An optional object with no fields.
    pub fn empty() -> Self {
        Self::new(Arc::new(ObjectDefinition {
            name: Self::KIND.to_string(),
            fields: IndexMap::new(),
            required_field_names: Vec::new(),
            additional_properties: false,
        }))
    }

    /// Mark the node as required.
    #[must_use]
    pub fn required(self) -> Self {
        self.with_required(true)
    }

    /// Set the required flag explicitly.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn definition(&self) -> &Arc<ObjectDefinition> {
        &self.definition
    }
}

impl Compile for ObjectType {
    fn compile(&self) -> Value {
        let properties: Map<String, Value> = self
            .definition
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), ty.compile()))
            .collect();

        let mut fragment = Map::new();
        fragment.insert("properties".to_string(), Value::Object(properties));
        fragment.insert("type".to_string(), type_keyword(Self::KIND, self.required));
        // An empty `required` array is not the same constraint as none.
        if !self.definition.required_field_names.is_empty() {
            let names = self
                .definition
                .required_field_names
                .iter()
                .cloned()
                .map(Value::String)
                .collect();
            fragment.insert("required".to_string(), Value::Array(names));
        }
        Value::Object(fragment)
    }

    fn is_required(&self) -> bool {
        self.required
    }
}
