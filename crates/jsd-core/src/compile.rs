//! Top-level entry points: compile a root node, normalize for comparison.

use serde_json::Value;

use crate::error::DefinitionError;
use crate::normalize::IntoType;
use crate::types::Compile;

/// Materialize `root` and compile it into a schema document.
pub fn compile(root: impl IntoType) -> Result<Value, DefinitionError> {
    let root = root.into_type()?;
    let schema = root.compile();
    tracing::debug!(kind = root.kind_name(), required = root.is_required(), "compiled schema");
    Ok(schema)
}

/// A copy of `value` with every array sorted by its JSON text.
///
/// JSON Schema consumers treat `type` unions and `required` lists as sets;
/// normalizing both sides makes document comparison order-insensitive.
pub fn normalized(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(normalized).collect();
            items.sort_by_cached_key(Value::to_string);
            Value::Array(items)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), normalized(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
