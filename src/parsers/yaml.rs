//! YAML document values.

use super::{ValueParser, combine_key};
use crate::error::{ConfigError, Result};
use serde_yaml::Value as YamlValue;

/// Flattens a YAML mapping into `:`-delimited keys.
///
/// Follows the same rules as [`JsonValueParser`](super::JsonValueParser)
/// when the `json` feature is enabled: sequences are indexed and `~`
/// becomes an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlValueParser;

impl ValueParser for YamlValueParser {
    fn parse(&self, parent_key: &str, value: &[u8]) -> Result<Vec<(String, String)>> {
        let yaml: YamlValue =
            serde_yaml::from_slice(value).map_err(|e| ConfigError::parse(parent_key, e))?;

        match yaml {
            YamlValue::Mapping(_) => {
                let mut pairs = Vec::new();
                flatten(parent_key, yaml, &mut pairs)?;
                Ok(pairs)
            }
            _ => Err(ConfigError::parse(
                parent_key,
                "expected a YAML mapping at root level",
            )),
        }
    }
}

fn flatten(prefix: &str, value: YamlValue, out: &mut Vec<(String, String)>) -> Result<()> {
    match value {
        YamlValue::Mapping(map) => {
            for (key, child) in map {
                let key = scalar_to_string(prefix, key)?;
                flatten(&combine_key(prefix, &key), child, out)?;
            }
        }
        YamlValue::Sequence(items) => {
            for (index, child) in items.into_iter().enumerate() {
                flatten(&combine_key(prefix, &index.to_string()), child, out)?;
            }
        }
        YamlValue::Tagged(tagged) => flatten(prefix, tagged.value, out)?,
        scalar => out.push((prefix.to_string(), scalar_to_string(prefix, scalar)?)),
    }
    Ok(())
}

fn scalar_to_string(prefix: &str, value: YamlValue) -> Result<String> {
    match value {
        YamlValue::Null => Ok(String::new()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::String(s) => Ok(s),
        _ => Err(ConfigError::parse(prefix, "mapping keys must be scalars")),
    }
}
