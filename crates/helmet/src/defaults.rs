//! Filling unset fields from a defaults value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Copies every zero-valued field of `target` from `defaults`.
///
/// Zero values are `null`, `false`, `0`, the empty string and the empty
/// list. Nested records are merged field by field, so a record that is set
/// only partially still picks up the defaults of its other fields. Fields
/// that already hold a non-zero value are left alone.
///
/// ```rust
/// use helmet::apply_defaults;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Input {
///     name: String,
///     replicas: u32,
/// }
///
/// let mut input = Input { name: "web".into(), ..Default::default() };
/// apply_defaults(&mut input, &Input { name: "app".into(), replicas: 2 }).unwrap();
/// assert_eq!(input.name, "web");
/// assert_eq!(input.replicas, 2);
/// ```
pub fn apply_defaults<T>(target: &mut T, defaults: &T) -> Result<(), serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(&*target)?;
    fill_zero(&mut merged, serde_json::to_value(defaults)?);
    *target = serde_json::from_value(merged)?;
    Ok(())
}

fn fill_zero(target: &mut Value, defaults: Value) {
    match (target, defaults) {
        (Value::Object(target), Value::Object(defaults)) => {
            for (key, default) in defaults {
                match target.get_mut(&key) {
                    Some(value) => fill_zero(value, default),
                    None => {
                        target.insert(key, default);
                    }
                }
            }
        }
        (target, default) if is_zero(target) => *target = default,
        _ => {}
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}
