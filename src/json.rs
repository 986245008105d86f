use crate::value::{Number, Value};
pub use serde_json::Value as JsonValue;

impl From<&JsonValue> for Value {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or_default())),
            },
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(seq) => seq.iter().map(Value::from).collect(),
            JsonValue::Object(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), Value::from(value)))
                .collect(),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        Value::from(&value)
    }
}
