//! Flattening store entries into a snapshot.

use crate::core::ConfigSnapshot;
use crate::error::Result;
use crate::parsers::{KEY_DELIMITER, ValueParser};
use crate::store::KvEntry;

/// Parse every valued entry and union the results into one snapshot.
///
/// Entries without a value never reach the parser. Colliding keys across
/// entries resolve last-wins in iteration order.
pub(crate) fn merge_entries(
    entries: &[KvEntry],
    key_to_remove: &str,
    parser: &dyn ValueParser,
) -> Result<ConfigSnapshot> {
    let mut snapshot = ConfigSnapshot::empty();

    for entry in entries.iter().filter(|entry| entry.has_value()) {
        let Some(value) = entry.value.as_deref() else {
            continue;
        };
        let parent = parent_key(&entry.key, key_to_remove);
        for (key, value) in parser.parse(&parent, value)? {
            snapshot.insert(key, value);
        }
    }

    Ok(snapshot)
}

/// `app/db/primary` with `app` removed becomes `db:primary`.
pub(crate) fn parent_key(key: &str, key_to_remove: &str) -> String {
    key.strip_prefix(key_to_remove)
        .unwrap_or(key)
        .trim_matches('/')
        .replace('/', KEY_DELIMITER)
}
