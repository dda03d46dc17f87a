//! Plain text values.

use super::ValueParser;
use crate::error::{ConfigError, Result};

/// Uses the whole stored value, as UTF-8 text, as the value of the entry's key.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::parsers::{TextValueParser, ValueParser};
///
/// let pairs = TextValueParser.parse("db:host", b"localhost").unwrap();
/// assert_eq!(pairs, vec![("db:host".to_string(), "localhost".to_string())]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextValueParser;

impl ValueParser for TextValueParser {
    fn parse(&self, parent_key: &str, value: &[u8]) -> Result<Vec<(String, String)>> {
        let text = std::str::from_utf8(value).map_err(|e| ConfigError::parse(parent_key, e))?;
        Ok(vec![(parent_key.to_string(), text.to_string())])
    }
}
