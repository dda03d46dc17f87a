//! In-memory key-value store.

use super::{KvEntry, StoreClient};
use crate::core::WatchErrorFn;
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// An in-process [`StoreClient`] with blocking-watch semantics.
///
/// Every mutation bumps a global modify index. `fetch` remembers the
/// highest index it saw under a prefix and `await_change` returns once that
/// prefix moves past it, the same way a blocking query against a real store
/// resumes from the last index.
///
/// The last-seen index belongs to the handle, like a network client that
/// tracks its own blocking index. Give each provider its own handle from
/// [`client`](Self::client) when several of them watch one store.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::store::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.put("app/settings", r#"{"port": 8080}"#);
/// store.put_empty("app/folder/");
/// store.delete("app/settings");
///
/// // A second watcher over the same data
/// let watcher = store.client();
/// ```
pub struct MemoryStore {
    shared: Arc<Shared>,
    observed: Mutex<HashMap<String, u64>>,
}

struct Shared {
    state: Mutex<StoreState>,
    changes: watch::Sender<u64>,
}

#[derive(Default)]
struct StoreState {
    entries: BTreeMap<String, KvEntry>,
    /// Index of the most recent delete, under any prefix.
    deleted_index: u64,
    index: u64,
    unavailable: bool,
    fetch_count: u64,
}

impl StoreState {
    /// Modify index of the prefix as a watcher sees it.
    ///
    /// Deletes are tracked as one high-water mark, so a delete anywhere
    /// counts as a change under every prefix.
    fn prefix_index(&self, prefix: &str) -> u64 {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, entry)| entry.modify_index)
            .chain(std::iter::once(self.deleted_index))
            .max()
            .unwrap_or(0)
    }
}

impl Shared {
    fn mutate(&self, apply: impl FnOnce(&mut StoreState, u64)) {
        let index = {
            let mut state = self.state.lock();
            state.index += 1;
            let index = state.index;
            apply(&mut state, index);
            index
        };
        self.changes.send_replace(index);
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self::with_shared(Arc::new(Shared {
            state: Mutex::new(StoreState::default()),
            changes,
        }))
    }

    fn with_shared(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            observed: Mutex::new(HashMap::new()),
        }
    }

    /// A new handle over the same data with its own last-seen indexes.
    pub fn client(&self) -> Arc<Self> {
        Arc::new(Self::with_shared(Arc::clone(&self.shared)))
    }

    /// Write a value, replacing any previous one.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        self.shared.mutate(move |state, index| {
            state.entries.insert(key.clone(), KvEntry::new(key, value, index));
        });
    }

    /// Write an entry without a value, like a folder node.
    pub fn put_empty(&self, key: impl Into<String>) {
        let key = key.into();
        self.shared.mutate(move |state, index| {
            state.entries.insert(key.clone(), KvEntry::empty(key, index));
        });
    }

    /// Delete a key. Deleting counts as a change for watchers.
    pub fn delete(&self, key: &str) {
        self.shared.mutate(|state, index| {
            if state.entries.remove(key).is_some() {
                state.deleted_index = index;
            }
        });
    }

    /// Simulate the store going down or coming back.
    ///
    /// While unavailable, `fetch` fails with [`ConfigError::Transport`] and
    /// waiters report [`ConfigError::Watch`] through their error callback.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.mutate(|state, _| state.unavailable = unavailable);
    }

    /// Number of `fetch` calls served so far, across all handles.
    pub fn fetch_count(&self) -> u64 {
        self.shared.state.lock().fetch_count
    }

    /// Current global modify index.
    pub fn index(&self) -> u64 {
        self.shared.state.lock().index
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn fetch(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<KvEntry>>> {
        if cancel.is_cancelled() {
            return Err(ConfigError::Cancelled);
        }

        let (entries, index) = {
            let mut state = self.shared.state.lock();
            state.fetch_count += 1;
            if state.unavailable {
                return Err(ConfigError::Transport(format!(
                    "memory store unavailable while fetching '{}'",
                    prefix
                )));
            }

            let entries: Vec<KvEntry> = state
                .entries
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(_, entry)| entry.clone())
                .collect();
            (entries, state.prefix_index(prefix))
        };
        self.observed.lock().insert(prefix.to_string(), index);

        Ok((!entries.is_empty()).then_some(entries))
    }

    async fn await_change(
        &self,
        prefix: &str,
        on_error: &WatchErrorFn<'_>,
        cancel: &CancellationToken,
    ) {
        let mut changes = self.shared.changes.subscribe();

        loop {
            let (current, unavailable) = {
                let state = self.shared.state.lock();
                (state.prefix_index(prefix), state.unavailable)
            };

            {
                let mut observed = self.observed.lock();
                let seen = *observed.entry(prefix.to_string()).or_insert(current);
                if current > seen {
                    observed.insert(prefix.to_string(), current);
                    return;
                }
            }

            if unavailable {
                let error = ConfigError::Watch(format!(
                    "memory store unavailable while watching '{}'",
                    prefix
                ));
                on_error(&error);
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    fn ignore_errors() -> impl Fn(&ConfigError) + Send + Sync {
        |_: &ConfigError| {}
    }

    #[tokio::test]
    async fn test_fetch_prefix() {
        let store = MemoryStore::new();
        store.put("app/a", "1");
        store.put("app/b", "2");
        store.put("other/c", "3");

        let token = CancellationToken::new();
        let entries = store.fetch("app", &token).await.unwrap().unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["app/a", "app/b"]);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_missing_prefix_is_none() {
        let store = MemoryStore::new();
        let token = CancellationToken::new();
        assert!(store.fetch("missing", &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_unavailable() {
        let store = MemoryStore::new();
        store.put("app/a", "1");
        store.set_unavailable(true);

        let token = CancellationToken::new();
        let err = store.fetch("app", &token).await.unwrap_err();
        assert!(matches!(err, ConfigError::Transport(_)));
    }

    #[tokio::test]
    async fn test_await_change_wakes_on_put() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/a", "1");
        let token = CancellationToken::new();
        store.fetch("app", &token).await.unwrap();

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.put("app/a", "2");
        });

        let on_error = ignore_errors();
        let waited = timeout(
            Duration::from_secs(2),
            store.await_change("app", &on_error, &token),
        )
        .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_await_change_ignores_other_prefixes() {
        let store = MemoryStore::new();
        store.put("app/a", "1");
        let token = CancellationToken::new();
        store.fetch("app", &token).await.unwrap();
        store.put("other/b", "2");

        let on_error = ignore_errors();
        let waited = timeout(
            Duration::from_millis(100),
            store.await_change("app", &on_error, &token),
        )
        .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_delete_counts_as_change() {
        let store = MemoryStore::new();
        store.put("app/a", "1");
        let token = CancellationToken::new();
        store.fetch("app", &token).await.unwrap();
        store.delete("app/a");

        let on_error = ignore_errors();
        let waited = timeout(
            Duration::from_secs(1),
            store.await_change("app", &on_error, &token),
        )
        .await;
        assert!(waited.is_ok());
        assert!(store.fetch("app", &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_await_change_returns_on_cancel() {
        let store = MemoryStore::new();
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let on_error = ignore_errors();
        let waited = timeout(
            Duration::from_secs(1),
            store.await_change("app", &on_error, &token),
        )
        .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_watch_errors_reported_while_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/a", "1");
        let token = CancellationToken::new();
        store.fetch("app", &token).await.unwrap();
        store.set_unavailable(true);

        let reported = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reported);
        let on_error = move |err: &ConfigError| {
            assert!(matches!(err, ConfigError::Watch(_)));
            counter.fetch_add(1, Ordering::SeqCst);
        };

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.set_unavailable(false);
            writer.put("app/a", "2");
        });

        timeout(
            Duration::from_secs(1),
            store.await_change("app", &on_error, &token),
        )
        .await
        .unwrap();
        assert!(reported.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_clients_track_changes_independently() {
        let store = MemoryStore::new();
        store.put("app/a", "1");
        let first = store.client();
        let second = store.client();

        let token = CancellationToken::new();
        first.fetch("app", &token).await.unwrap();
        second.fetch("app", &token).await.unwrap();
        store.put("app/a", "2");

        let on_error = ignore_errors();
        for client in [&first, &second] {
            let waited = timeout(
                Duration::from_secs(1),
                client.await_change("app", &on_error, &token),
            )
            .await;
            assert!(waited.is_ok());
        }
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_deletes_keep_one_high_water_mark() {
        let store = MemoryStore::new();
        for i in 0..100 {
            store.put(format!("app/k{}", i), "v");
        }
        for i in 0..100 {
            store.delete(&format!("app/k{}", i));
        }
        store.delete("app/never-written");

        let state = store.shared.state.lock();
        assert!(state.entries.is_empty());
        assert_eq!(state.deleted_index, 200);
        assert_eq!(state.prefix_index("app"), 200);
        assert_eq!(state.prefix_index("other"), 200);
    }
}
