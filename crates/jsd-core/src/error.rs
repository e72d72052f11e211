//! # Definition Errors
//!
//! Every failure in this crate happens at definition time: while a schema
//! tree is being declared and harvested. Compilation of a well-formed tree
//! is total and has no error path.

use thiserror::Error;

/// Error raised while declaring or harvesting a schema definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The same field name was declared twice in one object definition.
    #[error("duplicate field '{field}' in object '{object}'")]
    DuplicateField {
        /// Name of the object definition.
        object: String,
        /// The repeated field name.
        field: String,
    },

    /// A oneOf union was constructed without alternatives.
    #[error("oneOf requires at least one alternative")]
    EmptyOneOf,

    /// A composition argument (field, item type, alternative) could not be
    /// turned into a type instance.
    #[error("invalid {argument}: {source}")]
    InvalidArgument {
        /// Which argument was rejected, e.g. `field 'Stuff.name'`.
        argument: String,
        /// Why it was rejected.
        #[source]
        source: Box<DefinitionError>,
    },

    /// An object definition contains itself while it is being harvested.
    #[error("object '{name}' contains itself; schema trees must be acyclic")]
    CyclicDefinition {
        /// Name of the object definition that re-entered.
        name: String,
    },
}

impl DefinitionError {
    /// Attach the offending argument to an error.
    pub(crate) fn at(self, argument: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            source: Box::new(self),
        }
    }
}
