//! A single record returned by the store.

/// One key-value record as returned by a [`StoreClient`](super::StoreClient).
///
/// An entry without a value is either a folder node or a deleted key. The
/// provider only reads entries; it never mutates or persists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    /// Full key path, e.g. `app/settings/db`
    pub key: String,
    /// Raw stored bytes, if any
    pub value: Option<Vec<u8>>,
    /// Store-specific change marker
    pub modify_index: u64,
}

impl KvEntry {
    /// Create an entry holding a value.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>, modify_index: u64) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            modify_index,
        }
    }

    /// Create an entry with no value (folder node or tombstone).
    pub fn empty(key: impl Into<String>, modify_index: u64) -> Self {
        Self {
            key: key.into(),
            value: None,
            modify_index,
        }
    }

    /// Whether this is a leaf entry carrying a value.
    ///
    /// Keys ending in `/` are folders even if the store attached bytes to them.
    pub fn has_value(&self) -> bool {
        self.value.is_some() && !self.key.ends_with('/')
    }
}
