use crate::error::{ModelError, Result};
use crate::tree::Environment;
use crate::value::Value;

/// Returns `true` for scalar leaf values: null, booleans, numbers and strings.
#[must_use]
pub const fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_))
}

/// Identity factory for primitive leaves.
///
/// The environment is accepted for signature parity with the other factories and ignored.
///
/// # Errors
/// Returns [`ModelError::InvalidPrimitive`] if `snapshot` is not primitive.
pub fn primitive_factory(snapshot: Value, _env: Option<&Environment>) -> Result<Value> {
    if is_primitive(&snapshot) {
        Ok(snapshot)
    } else {
        Err(ModelError::InvalidPrimitive { message: snapshot.kind_name().into(), context: None })
    }
}
