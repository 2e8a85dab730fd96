//! Flat query parameter maps and wire stringification.
//!
//! The query builder and per-call options all funnel into a single flat
//! [`ParamMap`]; [`to_wire_params`] turns that map into the string pairs a
//! transport sends. The stringification is deliberately lossy: nested
//! objects collapse to `"[object Object]"` and null values are dropped.
//! Existing deployments depend on those exact bytes.

use serde_json::Value;

/// A flat query parameter map, insertion-ordered when `serde_json` is built
/// with `preserve_order` and deterministic either way.
pub type ParamMap = serde_json::Map<String, Value>;

/// Shallow-merge `source` into `target`; `source` wins on key collisions.
pub fn merge_into(target: &mut ParamMap, source: &ParamMap) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Render a param map as wire-ready string pairs.
///
/// Null values are dropped entirely; arrays expand to one pair per element;
/// scalars stringify; plain objects degrade to `"[object Object]"`.
pub fn to_wire_params(params: &ParamMap) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    out.push((key.clone(), element_string(item)));
                }
            }
            other => out.push((key.clone(), element_string(other))),
        }
    }
    out
}

/// Stringify a single value the way loose string coercion does.
pub(crate) fn element_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(element_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ParamMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_nulls_are_dropped() {
        let params = map(json!({ "a": null, "b": "x" }));
        assert_eq!(to_wire_params(&params), vec![("b".into(), "x".into())]);
    }

    #[test]
    fn test_arrays_expand_element_wise() {
        let params = map(json!({ "tag": ["a", 2, true] }));
        assert_eq!(
            to_wire_params(&params),
            vec![
                ("tag".into(), "a".into()),
                ("tag".into(), "2".into()),
                ("tag".into(), "true".into()),
            ]
        );
    }

    #[test]
    fn test_objects_degrade() {
        let params = map(json!({ "nested": { "x": 1 } }));
        assert_eq!(
            to_wire_params(&params),
            vec![("nested".into(), "[object Object]".into())]
        );
    }

    #[test]
    fn test_scalars_stringify() {
        let params = map(json!({ "limit": 10, "flag": false, "q": "hi" }));
        let wire = to_wire_params(&params);
        assert!(wire.contains(&("limit".into(), "10".into())));
        assert!(wire.contains(&("flag".into(), "false".into())));
        assert!(wire.contains(&("q".into(), "hi".into())));
    }

    #[test]
    fn test_merge_source_wins() {
        let mut target = map(json!({ "a": 1, "b": 2 }));
        merge_into(&mut target, &map(json!({ "b": 3, "c": 4 })));
        assert_eq!(target, map(json!({ "a": 1, "b": 3, "c": 4 })));
    }
}
