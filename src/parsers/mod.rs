//! Value parsers that turn one stored value into flat configuration pairs.

mod text;

#[cfg(feature = "json")]
mod json;

#[cfg(feature = "yaml")]
mod yaml;

pub use text::TextValueParser;

#[cfg(feature = "json")]
pub use json::JsonValueParser;

#[cfg(feature = "yaml")]
pub use yaml::YamlValueParser;

use crate::error::Result;

/// Delimiter between segments of a flattened configuration key.
pub const KEY_DELIMITER: &str = ":";

/// Converts a raw stored value into zero or more flat key/value pairs.
///
/// `parent_key` is the entry's key with the removed prefix stripped and
/// `/` replaced by [`KEY_DELIMITER`]. Implementations prefix their own keys
/// with it using [`combine_key`].
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::parsers::{ValueParser, combine_key};
/// use hotswap_kv_config::error::Result;
///
/// struct UpperParser;
///
/// impl ValueParser for UpperParser {
///     fn parse(&self, parent_key: &str, value: &[u8]) -> Result<Vec<(String, String)>> {
///         let text = String::from_utf8_lossy(value).to_uppercase();
///         Ok(vec![(combine_key(parent_key, "value"), text)])
///     }
/// }
///
/// let pairs = UpperParser.parse("feature", b"on").unwrap();
/// assert_eq!(pairs, vec![("feature:value".to_string(), "ON".to_string())]);
/// ```
pub trait ValueParser: Send + Sync {
    /// Parse `value` stored under `parent_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`](crate::error::ConfigError::Parse) if the
    /// value is not in the expected format.
    fn parse(&self, parent_key: &str, value: &[u8]) -> Result<Vec<(String, String)>>;
}

impl<F> ValueParser for F
where
    F: Fn(&str, &[u8]) -> Result<Vec<(String, String)>> + Send + Sync,
{
    fn parse(&self, parent_key: &str, value: &[u8]) -> Result<Vec<(String, String)>> {
        self(parent_key, value)
    }
}

/// Join two key segments with [`KEY_DELIMITER`], skipping empty ones.
pub fn combine_key(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{}{}{}", parent, KEY_DELIMITER, child),
    }
}
