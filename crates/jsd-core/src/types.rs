//! # Schema Nodes
//!
//! The type-description model. Every node implements [`Compile`], which
//! emits the node's JSON Schema fragment. [`Type`] is the closed sum of all
//! node kinds and is what containers own.
//!
//! ## Required/Optional Duality
//!
//! Draft 4 has no "optional" keyword. A node that is not required accepts an
//! explicit `null` in addition to its primitive type:
//!
//! - required: `{"type": "string"}`
//! - optional: `{"type": ["string", "null"]}`
//!
//! [`OneOfType`] is the exception: it never wraps its own fragment, and its
//! `required` flag only matters to the enclosing object's `required` list.

use serde_json::{Map, Value};

use crate::error::DefinitionError;
use crate::normalize::IntoType;
use crate::object::ObjectType;

/// The contract every schema node implements.
///
/// Compilation is pure: it never mutates the node, and calling it twice
/// yields structurally identical output.
pub trait Compile {
    /// Emit the JSON Schema fragment for this node.
    fn compile(&self) -> Value;

    /// Whether the node rejects `null` and, as a field, must be present.
    fn is_required(&self) -> bool;
}

/// The `type` keyword value for a primitive under the duality rule.
pub(crate) fn type_keyword(kind: &str, required: bool) -> Value {
    if required {
        Value::String(kind.to_string())
    } else {
        Value::Array(vec![
            Value::String(kind.to_string()),
            Value::String("null".to_string()),
        ])
    }
}

fn base_fragment(kind: &str, required: bool) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert("type".to_string(), type_keyword(kind, required));
    fragment
}

macro_rules! scalar_type {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            required: bool,
        }

        impl $name {
            /// JSON Schema primitive name emitted by this node.
            pub const KIND: &'static str = $kind;

            /// An optional (nullable) instance.
            pub fn new() -> Self {
                Self::default()
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
        }

        impl Compile for $name {
            fn compile(&self) -> Value {
                Value::Object(base_fragment(Self::KIND, self.required))
            }

            fn is_required(&self) -> bool {
                self.required
            }
        }
    };
}

scalar_type! {
    /// A JSON boolean.
    BooleanType => "boolean"
}

scalar_type! {
    /// A JSON integer.
    IntegerType => "integer"
}

scalar_type! {
    /// Any JSON number.
    NumberType => "number"
}

/// A JSON string.
///
/// `min_len`, `max_len`, `format` and `pattern` are reserved configuration:
/// they are stored on the node but not emitted by [`Compile::compile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringType {
    required: bool,
    min_len: Option<u64>,
    max_len: Option<u64>,
    format: Option<String>,
    pattern: Option<String>,
}

impl StringType {
    /// JSON Schema primitive name emitted by this node.
    pub const KIND: &'static str = "string";

    /// An optional (nullable) string.
    pub fn new() -> Self {
        Self::default()
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

    /// Reserved: minimum length. Not emitted.
    #[must_use]
    pub fn min_len(mut self, min_len: u64) -> Self {
        self.min_len = Some(min_len);
        self
    }

    /// Reserved: maximum length. Not emitted.
    #[must_use]
    pub fn max_len(mut self, max_len: u64) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Reserved: format name. Not emitted.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Reserved: regular expression. Not emitted.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Declared minimum length; not emitted.
    pub fn min_len_setting(&self) -> Option<u64> {
        self.min_len
    }

    /// Declared maximum length; not emitted.
    pub fn max_len_setting(&self) -> Option<u64> {
        self.max_len
    }

    /// Declared format; not emitted.
    pub fn format_setting(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Declared pattern; not emitted.
    pub fn pattern_setting(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

impl Compile for StringType {
    fn compile(&self) -> Value {
        Value::Object(base_fragment(Self::KIND, self.required))
    }

    fn is_required(&self) -> bool {
        self.required
    }
}

/// A JSON array, optionally constraining its element type.
///
/// Without an item type the `items` keyword is omitted and elements are
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayType {
    item_type: Option<Box<Type>>,
    min_items: u64,
    required: bool,
}

impl ArrayType {
    /// JSON Schema primitive name emitted by this node.
    pub const KIND: &'static str = "array";

    /// An optional array with unconstrained elements and `minItems: 0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// An optional array whose elements match `item_type`.
    ///
    /// `item_type` may be a configured instance or a bare [`Kind`](crate::Kind);
    /// bare descriptors are materialized with default settings.
    pub fn of(item_type: impl IntoType) -> Result<Self, DefinitionError> {
        let item_type = item_type.into_type().map_err(|e| e.at("item_type"))?;
        Ok(Self {
            item_type: Some(Box::new(item_type)),
            ..Self::default()
        })
    }

    /// Minimum number of elements.
    #[must_use]
    pub fn min_items(mut self, min_items: u64) -> Self {
        self.min_items = min_items;
        self
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

    pub fn item_type(&self) -> Option<&Type> {
        self.item_type.as_deref()
    }

    pub fn min_items_setting(&self) -> u64 {
        self.min_items
    }
}

impl Compile for ArrayType {
    fn compile(&self) -> Value {
        let mut fragment = base_fragment(Self::KIND, self.required);
        fragment.insert("minItems".to_string(), Value::from(self.min_items));
        if let Some(item_type) = &self.item_type {
            fragment.insert("items".to_string(), item_type.compile());
        }
        Value::Object(fragment)
    }

    fn is_required(&self) -> bool {
        self.required
    }
}

/// A union: the value must match exactly one alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOfType {
    alternatives: Vec<Type>,
    required: bool,
}

impl OneOfType {
    /// Build a union from instances or bare descriptors.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::EmptyOneOf`] when `alternatives` is empty, or
    /// [`DefinitionError::InvalidArgument`] naming the alternative that
    /// could not be materialized.
    pub fn new<I>(alternatives: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator,
        I::Item: IntoType,
    {
        let alternatives = alternatives
            .into_iter()
            .enumerate()
            .map(|(i, alt)| alt.into_type().map_err(|e| e.at(format!("alternative {i}"))))
            .collect::<Result<Vec<_>, _>>()?;
        if alternatives.is_empty() {
            return Err(DefinitionError::EmptyOneOf);
        }
        Ok(Self {
            alternatives,
            required: false,
        })
    }

    /// Mark the union as required in its enclosing object.
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

    pub fn alternatives(&self) -> &[Type] {
        &self.alternatives
    }
}

impl Compile for OneOfType {
    // The union's own flag is deliberately not applied here; nullability
    // comes from the alternatives.
    fn compile(&self) -> Value {
        let alternatives = self.alternatives.iter().map(Compile::compile).collect();
        let mut fragment = Map::new();
        fragment.insert("oneOf".to_string(), Value::Array(alternatives));
        Value::Object(fragment)
    }

    fn is_required(&self) -> bool {
        self.required
    }
}

/// Any schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    String(StringType),
    Boolean(BooleanType),
    Integer(IntegerType),
    Number(NumberType),
    Array(ArrayType),
    Object(ObjectType),
    OneOf(OneOfType),
}

impl Type {
    /// Short label for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Type::String(_) => StringType::KIND,
            Type::Boolean(_) => BooleanType::KIND,
            Type::Integer(_) => IntegerType::KIND,
            Type::Number(_) => NumberType::KIND,
            Type::Array(_) => ArrayType::KIND,
            Type::Object(_) => ObjectType::KIND,
            Type::OneOf(_) => "oneOf",
        }
    }

    /// Set the required flag on whichever node this is.
    #[must_use]
    pub fn with_required(self, required: bool) -> Self {
        match self {
            Type::String(t) => Type::String(t.with_required(required)),
            Type::Boolean(t) => Type::Boolean(t.with_required(required)),
            Type::Integer(t) => Type::Integer(t.with_required(required)),
            Type::Number(t) => Type::Number(t.with_required(required)),
            Type::Array(t) => Type::Array(t.with_required(required)),
            Type::Object(t) => Type::Object(t.with_required(required)),
            Type::OneOf(t) => Type::OneOf(t.with_required(required)),
        }
    }
}

impl Compile for Type {
    fn compile(&self) -> Value {
        match self {
            Type::String(t) => t.compile(),
            Type::Boolean(t) => t.compile(),
            Type::Integer(t) => t.compile(),
            Type::Number(t) => t.compile(),
            Type::Array(t) => t.compile(),
            Type::Object(t) => t.compile(),
            Type::OneOf(t) => t.compile(),
        }
    }

    fn is_required(&self) -> bool {
        match self {
            Type::String(t) => t.is_required(),
            Type::Boolean(t) => t.is_required(),
            Type::Integer(t) => t.is_required(),
            Type::Number(t) => t.is_required(),
            Type::Array(t) => t.is_required(),
            Type::Object(t) => t.is_required(),
            Type::OneOf(t) => t.is_required(),
        }
    }
}

macro_rules! into_type_enum {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Type {
                fn from(node: $node) -> Self {
                    Type::$variant(node)
                }
            }
        )*
    };
}

into_type_enum! {
    StringType => String,
    BooleanType => Boolean,
    IntegerType => Integer,
    NumberType => Number,
    ArrayType => Array,
    ObjectType => Object,
    OneOfType => OneOf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Kind;
    use serde_json::json;

    #[test]
    fn optional_scalars_accept_null() {
        assert_eq!(StringType::new().compile(), json!({"type": ["string", "null"]}));
        assert_eq!(BooleanType::new().compile(), json!({"type": ["boolean", "null"]}));
        assert_eq!(IntegerType::new().compile(), json!({"type": ["integer", "null"]}));
        assert_eq!(NumberType::new().compile(), json!({"type": ["number", "null"]}));
    }

    #[test]
    fn required_scalars_emit_bare_type() {
        assert_eq!(StringType::new().required().compile(), json!({"type": "string"}));
        assert_eq!(BooleanType::new().required().compile(), json!({"type": "boolean"}));
        assert_eq!(IntegerType::new().required().compile(), json!({"type": "integer"}));
        assert_eq!(NumberType::new().required().compile(), json!({"type": "number"}));
    }

    #[test]
    fn string_placeholders_are_not_emitted() {
        let s = StringType::new()
            .required()
            .min_len(1)
            .max_len(64)
            .format("email")
            .pattern("^.+@.+$");
        assert_eq!(s.compile(), json!({"type": "string"}));
        assert_eq!(s.min_len_setting(), Some(1));
        assert_eq!(s.max_len_setting(), Some(64));
        assert_eq!(s.format_setting(), Some("email"));
        assert_eq!(s.pattern_setting(), Some("^.+@.+$"));
    }

    #[test]
    fn untyped_array_omits_items() {
        let compiled = ArrayType::new().compile();
        assert_eq!(compiled, json!({"type": ["array", "null"], "minItems": 0}));
        assert!(compiled.get("items").is_none());
    }

    #[test]
    fn array_min_items_without_item_type() {
        assert_eq!(
            ArrayType::new().min_items(5).compile(),
            json!({"type": ["array", "null"], "minItems": 5})
        );
    }

    #[test]
    fn array_items_match_item_compile() {
        let item = StringType::new().required();
        let array = ArrayType::of(item.clone()).unwrap();
        assert_eq!(
            array.compile(),
            json!({"type": ["array", "null"], "minItems": 0, "items": {"type": "string"}})
        );
        assert_eq!(array.compile()["items"], item.compile());
    }

    #[test]
    fn required_array_of_arrays() {
        let inner = ArrayType::of(BooleanType::new()).unwrap().min_items(2);
        let outer = ArrayType::of(inner.clone()).unwrap().required();
        let compiled = outer.compile();
        assert_eq!(compiled["type"], json!("array"));
        assert_eq!(compiled["items"], inner.compile());
    }

    #[test]
    fn array_of_bare_kind_uses_defaults() {
        let array = ArrayType::of(Kind::String).unwrap();
        assert_eq!(array.item_type(), Some(&Type::String(StringType::new())));
        assert_eq!(array.compile()["items"], json!({"type": ["string", "null"]}));
    }

    #[test]
    fn array_of_bare_one_of_is_rejected() {
        let err = ArrayType::of(Kind::OneOf).unwrap_err();
        match err {
            DefinitionError::InvalidArgument { argument, source } => {
                assert_eq!(argument, "item_type");
                assert_eq!(*source, DefinitionError::EmptyOneOf);
            }
            other => panic!("expected InvalidArgument, got: {other}"),
        }
    }

    #[test]
    fn one_of_ignores_its_own_required_flag() {
        let alternatives = || [Type::from(StringType::new().required()), BooleanType::new().required().into()];
        let expected = json!({"oneOf": [{"type": "string"}, {"type": "boolean"}]});

        let optional = OneOfType::new(alternatives()).unwrap();
        let required = OneOfType::new(alternatives()).unwrap().required();
        assert_eq!(optional.compile(), expected);
        assert_eq!(required.compile(), expected);
        assert!(!optional.is_required());
        assert!(required.is_required());
    }

    #[test]
    fn one_of_keeps_nullable_alternatives() {
        let union = OneOfType::new([
            Type::from(StringType::new()),
            Type::from(BooleanType::new().required()),
        ])
        .unwrap();
        assert_eq!(
            union.compile(),
            json!({"oneOf": [{"type": ["string", "null"]}, {"type": "boolean"}]})
        );
    }

    #[test]
    fn one_of_accepts_bare_kinds() {
        let union = OneOfType::new([Kind::String, Kind::Integer]).unwrap();
        assert_eq!(union.alternatives().len(), 2);
        assert_eq!(
            union.compile(),
            json!({"oneOf": [{"type": ["string", "null"]}, {"type": ["integer", "null"]}]})
        );
    }

    #[test]
    fn empty_one_of_is_rejected() {
        let err = OneOfType::new(Vec::<Type>::new()).unwrap_err();
        assert_eq!(err, DefinitionError::EmptyOneOf);
    }

    #[test]
    fn one_of_names_the_bad_alternative() {
        let err = OneOfType::new([Kind::Boolean, Kind::OneOf]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid alternative 1: oneOf requires at least one alternative"
        );
    }

    #[test]
    fn type_dispatch_matches_node() {
        let node = ArrayType::of(IntegerType::new().required()).unwrap().min_items(1);
        let ty = Type::from(node.clone());
        assert_eq!(ty.compile(), node.compile());
        assert_eq!(ty.is_required(), node.is_required());
        assert_eq!(ty.kind_name(), "array");
        assert!(ty.with_required(true).is_required());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for arbitrary scalar and array trees.
    fn arb_type() -> impl Strategy<Value = Type> {
        let leaf = prop_oneof![
            any::<bool>().prop_map(|r| Type::from(StringType::new().with_required(r))),
            any::<bool>().prop_map(|r| Type::from(BooleanType::new().with_required(r))),
            any::<bool>().prop_map(|r| Type::from(IntegerType::new().with_required(r))),
            any::<bool>().prop_map(|r| Type::from(NumberType::new().with_required(r))),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                (inner.clone(), any::<bool>(), 0u64..8).prop_map(|(item, r, n)| {
                    Type::from(ArrayType::of(item).unwrap().min_items(n).with_required(r))
                }),
                (prop::collection::vec(inner, 1..4), any::<bool>()).prop_map(|(alts, r)| {
                    Type::from(OneOfType::new(alts).unwrap().with_required(r))
                }),
            ]
        })
    }

    proptest! {
        /// Compilation is repeatable and leaves the node untouched.
        #[test]
        fn compile_is_pure(ty in arb_type()) {
            let before = ty.clone();
            let first = ty.compile();
            let second = ty.compile();
            prop_assert_eq!(first, second);
            prop_assert_eq!(ty, before);
        }

        /// Every node except oneOf follows the null duality on `type`.
        #[test]
        fn duality_holds(ty in arb_type()) {
            let compiled = ty.compile();
            if let Type::OneOf(_) = ty {
                prop_assert!(compiled.get("type").is_none());
            } else if ty.is_required() {
                prop_assert_eq!(&compiled["type"], &Value::from(ty.kind_name()));
            } else {
                prop_assert_eq!(
                    &compiled["type"],
                    &Value::from(vec![ty.kind_name(), "null"])
                );
            }
        }
    }
}
