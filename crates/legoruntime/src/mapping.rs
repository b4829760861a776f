//! Dot-path access into JSON payloads and response re-shaping.

use serde_json::{Map, Value};

/// Index one level into a value. Numeric segments also index arrays.
pub fn step_into<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Follow a dot path (`"data.head.name"`) into a value.
pub fn get_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, step_into)
}

/// Write `value` at a dot path, creating intermediate objects.
pub fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut keys: Vec<&str> = path.split('.').collect();
    let Some(last) = keys.pop() else {
        return;
    };

    let mut current = target;
    for key in keys {
        let slot = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Some(next) = slot.as_object_mut() else {
            return;
        };
        current = next;
    }

    current.insert(last.to_string(), value);
}

/// Re-shape a raw provider payload. Every mapping target is present in the
/// output, in mapping order; targets whose source path is missing (or is not
/// a string) are `null`.
pub fn apply_response_mapping(data: &Value, mapping: &Map<String, Value>) -> Value {
    let mut mapped = Map::new();

    for (target, source) in mapping {
        let value = source
            .as_str()
            .and_then(|path| get_path(data, path))
            .cloned()
            .unwrap_or(Value::Null);
        set_path(&mut mapped, target, value);
    }

    Value::Object(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn maps_company_fields() {
        let data = json!({"data": {"name": "X", "head": "Y", "code": "123"}});
        let mapped = apply_response_mapping(
            &data,
            &mapping(&[("companyName", "data.name"), ("director", "data.head")]),
        );

        assert_eq!(mapped, json!({"companyName": "X", "director": "Y"}));
    }

    #[test]
    fn output_follows_mapping_order() {
        let data = json!({"a": 1, "b": 2});
        let mapped = apply_response_mapping(&data, &mapping(&[("zeta", "a"), ("alpha", "b")]));

        let keys: Vec<_> = mapped.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(mapped, json!({"zeta": 1, "alpha": 2}));
    }

    #[test]
    fn missing_source_yields_null() {
        let data = json!({"data": {}});
        let mapped = apply_response_mapping(&data, &mapping(&[("invoiceId", "data.invoiceId")]));

        assert_eq!(mapped, json!({"invoiceId": null}));
    }

    #[test]
    fn nested_targets_and_array_sources() {
        let data = json!({"items": [{"plate": "AA1234BB"}, {"plate": "BC0001AA"}]});
        let mapped = apply_response_mapping(
            &data,
            &mapping(&[("car.first", "items.0.plate"), ("car.second", "items.1.plate")]),
        );

        assert_eq!(
            mapped,
            json!({"car": {"first": "AA1234BB", "second": "BC0001AA"}})
        );
    }

    #[test]
    fn set_path_replaces_scalars_on_the_way() {
        let mut map = Map::new();
        map.insert("a".to_string(), json!(1));
        set_path(&mut map, "a.b", json!(2));

        assert_eq!(Value::Object(map), json!({"a": {"b": 2}}));
    }
}
