//! # Definition Documents
//!
//! Object schemas declared as data. A document lists named objects; each
//! field is tagged with a type name and its settings:
//!
//! ```yaml
//! objects:
//!   - name: Email
//!     fields:
//!       - { name: service, type: string }
//!       - { name: value, type: string }
//!   - name: Person
//!     fields:
//!       - { name: name, type: string, required: true }
//!       - { name: email, type: Email }
//!       - name: groups
//!         type: array
//!         required: true
//!         items: { type: string }
//! ```
//!
//! Type names are `string`, `boolean`, `integer`, `number`, `array`,
//! `one_of`, `object` (no fields), or the name of another object in the
//! same document. Objects may be listed in any order.
//!
//! [`SchemaRegistry`] harvests every object exactly once, in dependency
//! order, and rejects unknown names, duplicate objects or fields, cycles,
//! and keywords that do not apply to the field's type.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use jsd_core::{
    ArrayType, BooleanType, Compile, DefinitionError, IntegerType, NumberType, ObjectDefinition,
    ObjectType, OneOfType, StringType, Type,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Type names with built-in meaning; objects may not use them.
pub const BUILTIN_TYPES: &[&str] = &[
    "string", "boolean", "integer", "number", "array", "one_of", "object",
];

/// Error while loading or resolving a definition document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document file could not be read.
    #[error("cannot read definitions '{path}': {source}")]
    Read {
        /// Path to the document.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not match the document shape.
    #[error("invalid YAML definitions: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not valid JSON or does not match the document shape.
    #[error("invalid JSON definitions: {0}")]
    Json(#[from] serde_json::Error),

    /// Two objects share a name.
    #[error("object '{name}' is defined more than once")]
    DuplicateObject {
        /// The repeated object name.
        name: String,
    },

    /// An object uses a built-in type name.
    #[error("object name '{name}' is reserved for a built-in type")]
    ReservedName {
        /// The offending object name.
        name: String,
    },

    /// A type name is neither built in nor defined in the document.
    #[error("unknown type '{name}' at {position}")]
    UnknownType {
        /// The unresolved type name.
        name: String,
        /// Where it was used, e.g. `Person.groups.items`.
        position: String,
    },

    /// A setting was given for a type that does not take it.
    #[error("'{keyword}' does not apply to type '{type_name}' at {position}")]
    UnexpectedKeyword {
        /// The misplaced setting.
        keyword: &'static str,
        /// The field's type name.
        type_name: String,
        /// Where it was used.
        position: String,
    },

    /// Objects contain or extend each other in a loop.
    #[error("cyclic object definitions: {chain}")]
    Cycle {
        /// The loop, e.g. `A -> B -> A`.
        chain: String,
    },

    /// The schema model rejected a declaration.
    #[error("invalid definition at {position}: {source}")]
    Definition {
        /// Where the declaration was made.
        position: String,
        /// The model's error.
        #[source]
        source: DefinitionError,
    },

    /// A lookup named an object the registry does not have.
    #[error("no object named '{name}' in the registry")]
    UnknownObject {
        /// The requested name.
        name: String,
    },
}

/// A parsed definition document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionDocument {
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

/// One named object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSpec {
    pub name: String,
    /// Objects whose fields this one inherits, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default)]
    pub additional_properties: bool,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// A named field.
///
/// Read through [`FieldEntry`] so that unknown keys on a field are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldEntry", into = "FieldEntry")]
pub struct FieldSpec {
    pub name: String,
    pub spec: TypeSpec,
}

/// A type reference with its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<TypeSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<TypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// On-disk shape of a field: its name beside the type settings, in one
/// strict mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<TypeSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    one_of: Vec<TypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
}

impl From<FieldEntry> for FieldSpec {
    fn from(entry: FieldEntry) -> Self {
        Self {
            name: entry.name,
            spec: TypeSpec {
                type_name: entry.type_name,
                required: entry.required,
                items: entry.items,
                min_items: entry.min_items,
                one_of: entry.one_of,
                min_len: entry.min_len,
                max_len: entry.max_len,
                format: entry.format,
                pattern: entry.pattern,
            },
        }
    }
}

impl From<FieldSpec> for FieldEntry {
    fn from(field: FieldSpec) -> Self {
        let spec = field.spec;
        Self {
            name: field.name,
            type_name: spec.type_name,
            required: spec.required,
            items: spec.items,
            min_items: spec.min_items,
            one_of: spec.one_of,
            min_len: spec.min_len,
            max_len: spec.max_len,
            format: spec.format,
            pattern: spec.pattern,
        }
    }
}

impl DefinitionDocument {
    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a document, choosing the format by extension (`.json` is JSON,
    /// anything else is YAML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

/// Harvested object definitions from one document, by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    definitions: IndexMap<String, Arc<ObjectDefinition>>,
}

impl SchemaRegistry {
    /// Parse and harvest a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, DocumentError> {
        Self::from_document(&DefinitionDocument::from_yaml_str(source)?)
    }

    /// Parse and harvest a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, DocumentError> {
        Self::from_document(&DefinitionDocument::from_json_str(source)?)
    }

    /// Read and harvest a document file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_document(&DefinitionDocument::load(path)?)
    }

    /// Harvest every object in `document`.
    pub fn from_document(document: &DefinitionDocument) -> Result<Self, DocumentError> {
        let mut specs: IndexMap<&str, &ObjectSpec> = IndexMap::new();
        for object in &document.objects {
            if BUILTIN_TYPES.contains(&object.name.as_str()) {
                return Err(DocumentError::ReservedName {
                    name: object.name.clone(),
                });
            }
            if specs.insert(object.name.as_str(), object).is_some() {
                return Err(DocumentError::DuplicateObject {
                    name: object.name.clone(),
                });
            }
        }

        let mut resolver = Resolver {
            specs: &specs,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        };
        let mut definitions = IndexMap::new();
        for name in specs.keys() {
            definitions.insert(name.to_string(), resolver.resolve(name)?);
        }
        Ok(Self { definitions })
    }

    /// Object names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Look up a harvested definition by object name.
    pub fn definition(&self, name: &str) -> Option<&Arc<ObjectDefinition>> {
        self.definitions.get(name)
    }

    /// Returns the number of objects.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the document declared no objects.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// An instance of the named object.
    pub fn object(&self, name: &str, required: bool) -> Result<ObjectType, DocumentError> {
        self.definition(name)
            .map(|definition| definition.instance().with_required(required))
            .ok_or_else(|| DocumentError::UnknownObject {
                name: name.to_string(),
            })
    }

    /// Compile the named object as a schema root.
    pub fn compile(&self, name: &str, required: bool) -> Result<Value, DocumentError> {
        Ok(self.object(name, required)?.compile())
    }
}

struct Resolver<'a> {
    specs: &'a IndexMap<&'a str, &'a ObjectSpec>,
    resolved: HashMap<String, Arc<ObjectDefinition>>,
    in_progress: Vec<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<ObjectDefinition>, DocumentError> {
        if let Some(definition) = self.resolved.get(name) {
            return Ok(Arc::clone(definition));
        }
        if self.in_progress.iter().any(|n| n == name) {
            let mut chain = self.in_progress.clone();
            chain.push(name.to_string());
            return Err(DocumentError::Cycle {
                chain: chain.join(" -> "),
            });
        }
        let specs = self.specs;
        let spec: &ObjectSpec = specs.get(name).ok_or_else(|| DocumentError::UnknownObject {
            name: name.to_string(),
        })?;

        self.in_progress.push(name.to_string());
        let built = self.build(spec);
        self.in_progress.pop();

        let definition = Arc::new(built?);
        tracing::debug!(object = name, fields = definition.len(), "resolved document object");
        self.resolved.insert(name.to_string(), Arc::clone(&definition));
        Ok(definition)
    }

    fn build(&mut self, spec: &ObjectSpec) -> Result<ObjectDefinition, DocumentError> {
        let mut builder = ObjectDefinition::builder(spec.name.as_str())
            .additional_properties(spec.additional_properties);

        for parent in &spec.extends {
            if !self.specs.contains_key(parent.as_str()) {
                return Err(DocumentError::UnknownType {
                    name: parent.clone(),
                    position: format!("{}.extends", spec.name),
                });
            }
            builder = builder.extends(&self.resolve(parent)?);
        }

        for field in &spec.fields {
            let position = format!("{}.{}", spec.name, field.name);
            let ty = self.materialize(&field.spec, &position)?;
            builder = builder.field(field.name.as_str(), ty);
        }

        builder.build().map_err(|source| DocumentError::Definition {
            position: spec.name.clone(),
            source,
        })
    }

    fn materialize(&mut self, spec: &TypeSpec, position: &str) -> Result<Type, DocumentError> {
        check_keywords(spec, position)?;

        let ty: Type = match spec.type_name.as_str() {
            "string" => {
                let mut string = StringType::new();
                if let Some(min_len) = spec.min_len {
                    string = string.min_len(min_len);
                }
                if let Some(max_len) = spec.max_len {
                    string = string.max_len(max_len);
                }
                if let Some(format) = &spec.format {
                    string = string.format(format.as_str());
                }
                if let Some(pattern) = &spec.pattern {
                    string = string.pattern(pattern.as_str());
                }
                string.into()
            }
            "boolean" => BooleanType::new().into(),
            "integer" => IntegerType::new().into(),
            "number" => NumberType::new().into(),
            "array" => {
                let array = match &spec.items {
                    Some(items) => {
                        let items_position = format!("{position}.items");
                        let item = self.materialize(items, &items_position)?;
                        ArrayType::of(item).map_err(|source| DocumentError::Definition {
                            position: items_position,
                            source,
                        })?
                    }
                    None => ArrayType::new(),
                };
                array.min_items(spec.min_items.unwrap_or(0)).into()
            }
            "one_of" => {
                let alternatives = spec
                    .one_of
                    .iter()
                    .enumerate()
                    .map(|(i, alt)| self.materialize(alt, &format!("{position}.one_of[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                OneOfType::new(alternatives)
                    .map_err(|source| DocumentError::Definition {
                        position: position.to_string(),
                        source,
                    })?
                    .into()
            }
            "object" => ObjectType::empty().into(),
            other if self.specs.contains_key(other) => self.resolve(other)?.instance().into(),
            other => {
                return Err(DocumentError::UnknownType {
                    name: other.to_string(),
                    position: position.to_string(),
                })
            }
        };
        Ok(ty.with_required(spec.required))
    }
}

fn check_keywords(spec: &TypeSpec, position: &str) -> Result<(), DocumentError> {
    let type_name = spec.type_name.as_str();
    let misplaced = [
        ("items", spec.items.is_some(), "array"),
        ("min_items", spec.min_items.is_some(), "array"),
        ("one_of", !spec.one_of.is_empty(), "one_of"),
        ("min_len", spec.min_len.is_some(), "string"),
        ("max_len", spec.max_len.is_some(), "string"),
        ("format", spec.format.is_some(), "string"),
        ("pattern", spec.pattern.is_some(), "string"),
    ]
    .into_iter()
    .find(|(_, present, applies_to)| *present && *applies_to != type_name);

    match misplaced {
        Some((keyword, _, _)) => Err(DocumentError::UnexpectedKeyword {
            keyword,
            type_name: type_name.to_string(),
            position: position.to_string(),
        }),
        None => Ok(()),
    }
}
