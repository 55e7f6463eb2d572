use serde_json::Value;

/// A single external record: string keys to JSON-shaped values, schema unknown.
/// This is the target-language expression of the design note's "tagged
/// AttributeMap sum type" — `serde_json::Value` already is one, so no
/// hand-rolled enum is needed.
pub type AttributeMap = serde_json::Map<String, Value>;

pub fn get_str<'a>(m: &'a AttributeMap, key: &str) -> Option<&'a str> {
    m.get(key).and_then(Value::as_str)
}

pub fn get_id<'a>(m: &'a AttributeMap, key: &str) -> Option<&'a str> {
    get_str(m, key)
}

pub fn get_bool(m: &AttributeMap, key: &str) -> Option<bool> {
    m.get(key).and_then(Value::as_bool)
}

pub fn get_i64(m: &AttributeMap, key: &str) -> Option<i64> {
    m.get(key).and_then(Value::as_i64)
}

pub fn get_str_array(m: &AttributeMap, key: &str) -> Vec<String> {
    m.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub fn has_key(m: &AttributeMap, key: &str) -> bool {
    m.contains_key(key)
}
