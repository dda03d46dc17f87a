//! JSON document values.

use super::{ValueParser, combine_key};
use crate::error::{ConfigError, Result};
use serde_json::Value as JsonValue;

/// Flattens a JSON object into `:`-delimited keys.
///
/// Nested objects extend the key path, arrays are indexed from zero,
/// scalars are stringified and `null` becomes an empty string.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::parsers::{JsonValueParser, ValueParser};
///
/// let pairs = JsonValueParser
///     .parse("app", br#"{"server": {"port": 8080}, "hosts": ["a", "b"]}"#)
///     .unwrap();
/// assert!(pairs.contains(&("app:server:port".to_string(), "8080".to_string())));
/// assert!(pairs.contains(&("app:hosts:1".to_string(), "b".to_string())));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValueParser;

impl ValueParser for JsonValueParser {
    fn parse(&self, parent_key: &str, value: &[u8]) -> Result<Vec<(String, String)>> {
        let json: JsonValue =
            serde_json::from_slice(value).map_err(|e| ConfigError::parse(parent_key, e))?;

        match json {
            JsonValue::Object(_) => {
                let mut pairs = Vec::new();
                flatten(parent_key, json, &mut pairs);
                Ok(pairs)
            }
            _ => Err(ConfigError::parse(
                parent_key,
                "expected a JSON object at root level",
            )),
        }
    }
}

fn flatten(prefix: &str, value: JsonValue, out: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                flatten(&combine_key(prefix, &key), child, out);
            }
        }
        JsonValue::Array(items) => {
            for (index, child) in items.into_iter().enumerate() {
                flatten(&combine_key(prefix, &index.to_string()), child, out);
            }
        }
        JsonValue::Null => out.push((prefix.to_string(), String::new())),
        JsonValue::String(s) => out.push((prefix.to_string(), s)),
        JsonValue::Bool(b) => out.push((prefix.to_string(), b.to_string())),
        JsonValue::Number(n) => out.push((prefix.to_string(), n.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_nested_object() {
        let pairs = JsonValueParser
            .parse(
                "",
                br#"{"server": {"port": 8080, "tls": true}, "name": null}"#,
            )
            .unwrap();
        let map: HashMap<_, _> = pairs.into_iter().collect();

        assert_eq!(map.get("server:port").map(String::as_str), Some("8080"));
        assert_eq!(map.get("server:tls").map(String::as_str), Some("true"));
        assert_eq!(map.get("name").map(String::as_str), Some(""));
    }

    #[test]
    fn test_arrays_indexed() {
        let pairs = JsonValueParser
            .parse("cache", br#"{"nodes": [{"host": "a"}, {"host": "b"}]}"#)
            .unwrap();
        let map: HashMap<_, _> = pairs.into_iter().collect();

        assert_eq!(map.get("cache:nodes:0:host").map(String::as_str), Some("a"));
        assert_eq!(map.get("cache:nodes:1:host").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = JsonValueParser.parse("list", b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = JsonValueParser.parse("broken", b"{\"a\": ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref key, .. } if key == "broken"));
    }
}
