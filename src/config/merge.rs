//! Deep merge of a custom configuration over defaults.

use serde_json::Value;

/// Deep-merges `custom` over `defaults`.
///
/// For each key in `custom`: when both sides hold mappings the merge recurses,
/// otherwise the custom value replaces the default outright. Lists are
/// replaced, never concatenated. A missing, empty or non-mapping `custom`
/// yields a copy of `defaults`. The merge is total and performs no validation.
#[must_use]
pub fn merge_config(custom: Option<&Value>, defaults: &Value) -> Value {
    let Some(Value::Object(custom_map)) = custom else {
        return defaults.clone();
    };

    let mut result = match defaults {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };

    for (key, value) in custom_map {
        let merged = match (result.get(key), value) {
            (Some(default @ Value::Object(_)), Value::Object(_)) => {
                merge_config(Some(value), default)
            }
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    Value::Object(result)
}
