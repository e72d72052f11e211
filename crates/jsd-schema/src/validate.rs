//! # Schema Validation
//!
//! Hands compiled schemas to the `jsonschema` engine (Draft 4) and reports
//! failures as structured violations.
//!
//! Validation itself is entirely the engine's job. This module only builds
//! the engine's validator from a compiled document and translates its
//! errors, each with the instance path, the schema path, and a message.

use std::fmt;
use std::path::Path;

use jsd_core::{Compile, DefinitionError, IntoType};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::document::{DocumentError, SchemaRegistry};

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The root type could not be declared.
    #[error("schema definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// The root object could not be taken from a registry.
    #[error("schema registry error: {0}")]
    Registry(#[from] DocumentError),

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The engine rejected the compiled schema.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema name.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations in the order the engine reported them.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Take ownership of the violations.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled schema document paired with the engine's validator for it.
///
/// `SchemaValidator` is `Send + Sync`; build it once and share it.
pub struct SchemaValidator {
    name: String,
    schema: Value,
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Build a Draft 4 validator for an already compiled schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidatorBuildError` if the engine
    /// rejects the document.
    pub fn new(name: impl Into<String>, schema: Value) -> Result<Self, SchemaValidationError> {
        let name = name.into();
        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft4);
        let validator = opts
            .build(&schema)
            .map_err(|e| SchemaValidationError::ValidatorBuildError {
                schema_name: name.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(schema = %name, "built draft-4 validator");
        Ok(Self {
            name,
            schema,
            validator,
        })
    }

    /// Compile `root` and build a validator for it.
    pub fn for_type(
        name: impl Into<String>,
        root: impl IntoType,
    ) -> Result<Self, SchemaValidationError> {
        let schema = root.into_type()?.compile();
        Self::new(name, schema)
    }

    /// Build a validator for a registry object used as the schema root.
    pub fn from_registry(
        registry: &SchemaRegistry,
        name: &str,
        required: bool,
    ) -> Result<Self, SchemaValidationError> {
        let schema = registry.compile(name, required)?;
        Self::new(name, schema)
    }

    /// Name of the object the schema was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled schema document.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns true if `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidationFailed` with structured
    /// violation details if the value is invalid.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: self.name.clone(),
                violations: ValidationViolations { violations },
            })
        }
    }

    /// Load a JSON or YAML document (`.yaml`/`.yml` are YAML, anything
    /// else JSON) and validate it.
    pub fn validate_file(&self, path: &Path) -> Result<(), SchemaValidationError> {
        let load_error = |reason: String| SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(format!("cannot read file: {e}")))?;

        let instance: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| load_error(format!("invalid JSON: {e}")))?,
        };

        self.validate(&instance)
    }
}
