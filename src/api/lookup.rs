use serde_json::Value;

/// Walks a dotted path (e.g. `error.message`) through nested JSON objects.
///
/// Each segment indexes an object by key. If a segment is all digits and the
/// current value is an array, it indexes the array instead.
/// Returns `None` as soon as a segment cannot be resolved.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, step| match current {
        Value::Object(map) => map.get(step),
        Value::Array(items) => step.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Like [`lookup`], but only yields values that are "present":
/// not null, not `false`, not zero, and not empty.
pub fn lookup_present<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    lookup(value, path).filter(|found| is_truthy(found))
}

/// Renders a scalar as a plain string. Strings are returned without quotes,
/// and everything else is serialized as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Whether the value would count as "set" for an error marker.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
