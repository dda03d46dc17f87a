//! Immutable flat configuration snapshots.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One fully assembled, immutable configuration map.
///
/// Keys are compared case-insensitively. When two pairs collide the last
/// one wins, including the spelling of its key.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::core::ConfigSnapshot;
///
/// let snapshot = ConfigSnapshot::from_pairs([("Db:Host", "a"), ("db:host", "b")]);
/// assert_eq!(snapshot.len(), 1);
/// assert_eq!(snapshot.get("DB:HOST"), Some("b"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    version: u64,
    /// Folded key -> (key as written, value)
    values: HashMap<String, (String, String)>,
}

impl ConfigSnapshot {
    /// An empty snapshot at version 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from key/value pairs, last one wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut snapshot = Self::empty();
        for (key, value) in pairs {
            snapshot.insert(key.into(), value.into());
        }
        snapshot
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        self.values.insert(fold(&key), (key, value));
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Look up a value, ignoring key case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&fold(key)).map(|(_, value)| value.as_str())
    }

    /// Whether the key is present, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(&fold(key))
    }

    /// Publish sequence number; 0 until the first successful load.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .values()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Iterate over keys as they were written.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.values().map(|(key, _)| key.as_str())
    }

    /// Copy into an ordered map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}

impl fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("version", &self.version)
            .field("values", &self.to_map())
            .finish()
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}
