use crate::value::{Number, Value};
pub use serde_yaml::Value as YamlValue;

impl From<&YamlValue> for Value {
    fn from(value: &YamlValue) -> Self {
        match value {
            YamlValue::Null => Value::Null,
            YamlValue::Bool(b) => Value::Bool(*b),
            YamlValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or_default())),
            },
            YamlValue::String(s) => Value::String(s.clone()),
            YamlValue::Sequence(seq) => seq.iter().map(Value::from).collect(),
            YamlValue::Mapping(map) => map
                .iter()
                .filter_map(|(key, value)| {
                    scalar_key(key).map(|key| (key, Value::from(value)))
                })
                .collect(),
            YamlValue::Tagged(tagged) => Value::from(&tagged.value),
        }
    }
}

impl From<YamlValue> for Value {
    fn from(value: YamlValue) -> Self {
        Value::from(&value)
    }
}

// mapping keys are names; non-scalar keys have no path form and are
// dropped
fn scalar_key(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_keeps_document_order() {
        let yaml = serde_yaml::from_str::<YamlValue>("z: 1\na: 2\n").unwrap();
        match Value::from(&yaml) {
            Value::Mapping(map) => {
                assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["z", "a"]);
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn numeric_keys_become_names() {
        let yaml = serde_yaml::from_str::<YamlValue>("1: one\n2: two\n").unwrap();
        match Value::from(&yaml) {
            Value::Mapping(map) => {
                assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["1", "2"]);
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }
}
