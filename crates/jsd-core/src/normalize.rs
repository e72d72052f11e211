//! # Construct-If-Bare
//!
//! Composition sites (object fields, array items, oneOf alternatives) accept
//! either a configured node or a bare type descriptor. Bare descriptors are
//! materialized with default settings before they are stored.

use std::sync::Arc;

use crate::error::DefinitionError;
use crate::object::{ObjectDefinition, ObjectType};
use crate::types::{
    ArrayType, BooleanType, IntegerType, NumberType, OneOfType, StringType, Type,
};

/// A type variant without configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    String,
    Boolean,
    Integer,
    Number,
    /// An array with unconstrained elements.
    Array,
    /// A union. Bare unions have no alternatives and cannot be materialized.
    OneOf,
    /// An optional instance of a harvested object definition.
    Object(Arc<ObjectDefinition>),
}

impl Kind {
    /// Construct the default-configured node for this kind.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::EmptyOneOf`] for [`Kind::OneOf`].
    pub fn instantiate(&self) -> Result<Type, DefinitionError> {
        Ok(match self {
            Kind::String => StringType::new().into(),
            Kind::Boolean => BooleanType::new().into(),
            Kind::Integer => IntegerType::new().into(),
            Kind::Number => NumberType::new().into(),
            Kind::Array => ArrayType::new().into(),
            Kind::OneOf => return Err(DefinitionError::EmptyOneOf),
            Kind::Object(definition) => definition.instance().into(),
        })
    }
}

/// Either a configured node or a bare descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Instance(Type),
    Bare(Kind),
}

impl TypeRef {
    /// Instances pass through unchanged; bare descriptors are instantiated.
    pub fn materialize(self) -> Result<Type, DefinitionError> {
        match self {
            TypeRef::Instance(ty) => Ok(ty),
            TypeRef::Bare(kind) => kind.instantiate(),
        }
    }
}

impl From<Type> for TypeRef {
    fn from(ty: Type) -> Self {
        TypeRef::Instance(ty)
    }
}

impl From<Kind> for TypeRef {
    fn from(kind: Kind) -> Self {
        TypeRef::Bare(kind)
    }
}

/// Anything accepted where a schema node is expected.
///
/// Implemented for every node, for [`Type`], [`Kind`], [`TypeRef`], for
/// shared object definitions (as bare object references), and for
/// `Result<T, DefinitionError>` so fallible constructors compose directly.
pub trait IntoType {
    fn into_type(self) -> Result<Type, DefinitionError>;
}

impl IntoType for Type {
    fn into_type(self) -> Result<Type, DefinitionError> {
        Ok(self)
    }
}

impl IntoType for TypeRef {
    fn into_type(self) -> Result<Type, DefinitionError> {
        self.materialize()
    }
}

impl IntoType for Kind {
    fn into_type(self) -> Result<Type, DefinitionError> {
        self.instantiate()
    }
}

impl IntoType for Arc<ObjectDefinition> {
    fn into_type(self) -> Result<Type, DefinitionError> {
        Kind::Object(self).instantiate()
    }
}

impl<T: IntoType> IntoType for Result<T, DefinitionError> {
    fn into_type(self) -> Result<Type, DefinitionError> {
        self.and_then(IntoType::into_type)
    }
}

macro_rules! node_into_type {
    ($($node:ty),* $(,)?) => {
        $(
            impl IntoType for $node {
                fn into_type(self) -> Result<Type, DefinitionError> {
                    Ok(Type::from(self))
                }
            }
        )*
    };
}

node_into_type!(
    StringType,
    BooleanType,
    IntegerType,
    NumberType,
    ArrayType,
    ObjectType,
    OneOfType,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Compile;

    #[test]
    fn instance_is_returned_unchanged() {
        let configured = Type::from(StringType::new().required().pattern("^a"));
        let out = TypeRef::from(configured.clone()).materialize().unwrap();
        assert_eq!(out, configured);
    }

    #[test]
    fn bare_kinds_get_defaults() {
        for kind in [Kind::String, Kind::Boolean, Kind::Integer, Kind::Number, Kind::Array] {
            let ty = TypeRef::from(kind).materialize().unwrap();
            assert!(!ty.is_required(), "{} should default to optional", ty.kind_name());
        }
        assert_eq!(Kind::Array.instantiate().unwrap(), Type::from(ArrayType::new()));
    }

    #[test]
    fn bare_object_is_optional_instance() {
        let def = Arc::new(
            ObjectDefinition::builder("Email")
                .field("value", StringType::new())
                .build()
                .unwrap(),
        );
        let ty = Arc::clone(&def).into_type().unwrap();
        assert_eq!(ty, Type::from(def.instance()));
        assert!(!ty.is_required());
    }

    #[test]
    fn bare_one_of_fails() {
        assert_eq!(
            TypeRef::Bare(Kind::OneOf).materialize(),
            Err(DefinitionError::EmptyOneOf)
        );
    }

    #[test]
    fn result_errors_pass_through() {
        let failed: Result<StringType, DefinitionError> = Err(DefinitionError::EmptyOneOf);
        assert_eq!(failed.into_type(), Err(DefinitionError::EmptyOneOf));
    }
}
