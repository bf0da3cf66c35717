//! Small lookup helpers over untyped backend JSON.
//!
//! Lookups follow the backend's loose conventions: empty strings and `null`
//! count as missing, numbers are accepted where text is expected.
use serde_json::{Map, Value};

pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First key of `obj` holding usable text.
pub fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text(obj.get(*k)))
}

pub fn object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value?.as_object()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_nested_keys() {
        let v = json!({"data": {"token": "abc"}});
        assert_eq!(lookup(&v, &["data", "token"]), Some(&json!("abc")));
        assert_eq!(lookup(&v, &["data", "missing"]), None);
        assert_eq!(lookup(&json!("scalar"), &["data"]), None);
    }

    #[test]
    fn text_treats_empty_and_null_as_missing() {
        assert_eq!(text(Some(&json!(""))), None);
        assert_eq!(text(Some(&json!(null))), None);
        assert_eq!(text(Some(&json!(42))), Some("42".into()));
        assert_eq!(text(None), None);
    }
}
