//! The provider that owns the published snapshot and keeps it fresh.

use crate::core::merge::merge_entries;
use crate::core::policy::apply_policy;
use crate::core::{ConfigSnapshot, KvConfigSource};
use crate::error::{ConfigError, Result};
use crate::notify::{ReloadEvent, ReloadOutcome, SubscriberRegistry, SubscriptionHandle};
use crate::parsers::ValueParser;
use crate::store::StoreClient;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Exposes a watched key-value prefix as a flat, hot-reloaded snapshot.
///
/// Reads are lock-free: [`snapshot`](Self::snapshot) hands out the current
/// `Arc<ConfigSnapshot>`, and every load publishes a whole new snapshot with
/// a single atomic swap. Loads are serialized, so the initial
/// [`load`](Self::load) and background reloads never interleave.
///
/// With `reload_on_change` enabled, construction spawns exactly one poll
/// task that waits for the store to report a change, reloads, and notifies
/// subscribers. [`dispose`](Self::dispose) stops it.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::prelude::*;
/// use hotswap_kv_config::parsers::TextValueParser;
/// use hotswap_kv_config::store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let store = Arc::new(MemoryStore::new());
/// store.put("app/db/host", "localhost");
///
/// let source = KvConfigSource::builder("app")
///     .with_parser(TextValueParser)
///     .reload_on_change(true)
///     .build();
///
/// let provider = KvConfigProvider::new(source, store)?;
/// provider.load().await?;
/// assert_eq!(provider.get("db:host").as_deref(), Some("localhost"));
///
/// provider.dispose().await;
/// # Ok(())
/// # }
/// ```
pub struct KvConfigProvider {
    inner: Arc<ProviderInner>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

struct ProviderInner {
    source: KvConfigSource,
    parser: Arc<dyn ValueParser>,
    client: Arc<dyn StoreClient>,
    current: ArcSwap<ConfigSnapshot>,
    load_gate: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    subscribers: SubscriberRegistry,
}

impl KvConfigProvider {
    /// Create a provider for `source`, reading through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if the source has no value
    /// parser, or if `reload_on_change` is set and no tokio runtime is
    /// running to host the poll task.
    pub fn new(source: KvConfigSource, client: Arc<dyn StoreClient>) -> Result<Self> {
        let parser = source.parser.clone().ok_or_else(|| {
            ConfigError::Configuration(format!(
                "No value parser configured for key '{}'",
                source.watch_key
            ))
        })?;

        let inner = Arc::new(ProviderInner {
            source,
            parser,
            client,
            current: ArcSwap::from_pointee(ConfigSnapshot::empty()),
            load_gate: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
            subscribers: SubscriberRegistry::new(),
        });

        let poll_task = if inner.source.reload_on_change {
            let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
                ConfigError::Configuration(format!(
                    "reload_on_change requires a running tokio runtime: {}",
                    e
                ))
            })?;
            debug!(
                key = %inner.source.watch_key,
                store = %inner.client.name(),
                "Starting configuration poll task"
            );
            Some(runtime.spawn(poll_for_changes(Arc::clone(&inner))))
        } else {
            None
        };

        Ok(Self {
            inner,
            poll_task: Mutex::new(poll_task),
        })
    }

    /// Populate the snapshot from the store.
    ///
    /// Completes once the fetch, parse and publish have finished.
    ///
    /// # Errors
    ///
    /// Returns the load failure unless the load-exception handler marked it
    /// ignorable. A mandatory key with no data fails with
    /// [`ConfigError::MandatoryDataMissing`]. On error or ignored failure the
    /// previous snapshot stays published.
    pub async fn load(&self) -> Result<()> {
        self.inner.load(false).await.map(|_| ())
    }

    /// The current snapshot. Lock-free.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.inner.current.load_full()
    }

    /// Look up one key in the current snapshot, ignoring case.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.current.load().get(key).map(str::to_string)
    }

    /// Version of the current snapshot.
    pub fn version(&self) -> u64 {
        self.inner.current.load().version()
    }

    /// The source this provider serves.
    pub fn source(&self) -> &KvConfigSource {
        &self.inner.source
    }

    /// Register a callback fired after every background reload.
    ///
    /// Not fired for [`load`](Self::load). Drop the handle to unsubscribe.
    /// A panicking callback is logged and skipped; polling continues.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ReloadEvent) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(callback)
    }

    /// Whether the background poll task is still running.
    pub fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Cancel the poll task and wait up to the source's dispose timeout.
    ///
    /// Returns `true` if the task stopped in time (or never existed). An
    /// overrunning task is left detached; it exits once its in-flight store
    /// call observes the cancellation. Calling this more than once is fine.
    pub async fn dispose(&self) -> bool {
        self.inner.cancel.cancel();

        let task = self.poll_task.lock().take();
        let Some(task) = task else {
            return true;
        };

        let timeout = self.inner.source.dispose_timeout;
        match tokio::time::timeout(timeout, task).await {
            Ok(_) => {
                debug!(key = %self.inner.source.watch_key, "Configuration poll task stopped");
                true
            }
            Err(_) => {
                warn!(
                    key = %self.inner.source.watch_key,
                    timeout_ms = timeout.as_millis() as u64,
                    "Configuration poll task did not stop within the dispose timeout"
                );
                false
            }
        }
    }
}

impl Drop for KvConfigProvider {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl ProviderInner {
    /// One serialized load attempt with the exception policy applied.
    ///
    /// Returns the outcome with the version that was current when the
    /// attempt finished, read before the gate is released.
    async fn load(&self, reloading: bool) -> Result<(ReloadOutcome, u64)> {
        let _gate = self.load_gate.lock().await;

        #[cfg(feature = "metrics")]
        let timer = self.source.metrics.as_ref().map(|m| m.start_load());

        let result = match self.try_load(reloading).await {
            Err(ConfigError::Cancelled) => Err(ConfigError::Cancelled),
            Err(error) => match apply_policy(
                self.source.on_load_exception.as_ref(),
                &self.source.watch_key,
                reloading,
                error,
            ) {
                Some(error) => Err(error),
                None => Ok(ReloadOutcome::Ignored),
            },
            ok => ok,
        }
        .map(|outcome| (outcome, self.current.load().version()));

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.source.metrics, timer) {
            match &result {
                Ok((ReloadOutcome::Ignored, _)) => metrics.record_load_ignored(timer),
                Ok(_) => metrics.record_load_success(timer, self.current.load().len()),
                Err(_) => metrics.record_load_failure(timer),
            }
        }

        result
    }

    async fn try_load(&self, reloading: bool) -> Result<ReloadOutcome> {
        let key = &self.source.watch_key;
        let entries = self.client.fetch(key, &self.cancel).await?;

        let entries = match entries {
            Some(entries) if !entries.is_empty() => entries,
            _ if !self.source.optional => {
                if !reloading {
                    return Err(ConfigError::MandatoryDataMissing { key: key.clone() });
                }
                warn!(
                    key = %key,
                    "No data for mandatory key on reload; keeping the current snapshot"
                );
                return Ok(ReloadOutcome::Unchanged);
            }
            _ => Vec::new(),
        };

        debug!(key = %key, reloading, entries = entries.len(), "Fetched configuration entries");

        let snapshot = merge_entries(&entries, self.source.key_to_remove(), self.parser.as_ref())?;
        let version = self.current.load().version() + 1;
        let keys = snapshot.len();
        self.current.store(Arc::new(snapshot.with_version(version)));

        info!(key = %key, version, keys, reloading, "Published configuration snapshot");
        Ok(ReloadOutcome::Published)
    }
}

/// Wait for a change, reload, notify; until cancelled.
async fn poll_for_changes(inner: Arc<ProviderInner>) {
    let key = inner.source.watch_key.clone();
    let on_error = |error: &ConfigError| {
        warn!(key = %key, error = %error, "Transient error while watching for changes");
        if let Some(handler) = &inner.source.on_watch_error {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(error))).is_err() {
                error!(key = %key, "Watch error handler panicked");
            }
        }
    };

    while !inner.cancel.is_cancelled() {
        inner
            .client
            .await_change(&key, &on_error, &inner.cancel)
            .await;
        if inner.cancel.is_cancelled() {
            break;
        }

        match inner.load(true).await {
            Ok((outcome, version)) => {
                let event = ReloadEvent {
                    key: key.clone(),
                    version,
                    outcome,
                };
                inner.subscribers.notify_all(&event);
            }
            Err(ConfigError::Cancelled) => break,
            Err(error) => {
                error!(
                    key = %key,
                    kind = %error.kind(),
                    error = %error,
                    "Configuration reload failed; keeping the current snapshot"
                );
            }
        }
    }

    debug!(key = %key, "Configuration poll loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::TextValueParser;
    use crate::store::MemoryStore;

    fn source(key: &str) -> KvConfigSource {
        KvConfigSource::builder(key)
            .with_parser(TextValueParser)
            .build()
    }

    #[test]
    fn test_missing_parser_rejected() {
        let store = Arc::new(MemoryStore::new());
        let source = KvConfigSource::builder("app").build();

        let err = KvConfigProvider::new(source, store).err().unwrap();
        assert!(matches!(err, ConfigError::Configuration(_)));
    }

    #[test]
    fn test_reload_on_change_needs_runtime() {
        let store = Arc::new(MemoryStore::new());
        let source = KvConfigSource::builder("app")
            .with_parser(TextValueParser)
            .reload_on_change(true)
            .build();

        let err = KvConfigProvider::new(source, store).err().unwrap();
        assert!(matches!(err, ConfigError::Configuration(_)));
    }

    #[test]
    fn test_no_poll_task_without_reload() {
        let store = Arc::new(MemoryStore::new());
        let provider = KvConfigProvider::new(source("app"), store).unwrap();

        assert!(!provider.is_polling());
        assert_eq!(provider.version(), 0);
        assert!(provider.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_load_publishes_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/db/host", "localhost");
        store.put("app/db/port", "5432");

        let provider = KvConfigProvider::new(source("app"), store).unwrap();
        provider.load().await.unwrap();

        let snapshot = provider.snapshot();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.get("db:host"), Some("localhost"));
        assert_eq!(snapshot.get("DB:PORT"), Some("5432"));
    }

    #[tokio::test]
    async fn test_initial_missing_mandatory_fails() {
        let store = Arc::new(MemoryStore::new());
        let provider = KvConfigProvider::new(source("app"), store).unwrap();

        let err = provider.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::MandatoryDataMissing { ref key } if key == "app"));
        assert_eq!(provider.version(), 0);
    }

    #[tokio::test]
    async fn test_reload_missing_mandatory_keeps_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/a", "1");
        let provider = KvConfigProvider::new(source("app"), store.clone()).unwrap();
        provider.load().await.unwrap();
        let before = provider.snapshot();

        store.delete("app/a");
        let (outcome, version) = provider.inner.load(true).await.unwrap();

        assert_eq!(outcome, ReloadOutcome::Unchanged);
        assert_eq!(version, 1);
        assert!(Arc::ptr_eq(&before, &provider.snapshot()));
    }

    #[tokio::test]
    async fn test_reload_reports_the_version_it_published() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/a", "1");
        let provider = Arc::new(KvConfigProvider::new(source("app"), store.clone()).unwrap());
        provider.load().await.unwrap();

        store.put("app/a", "2");
        let gate = provider.inner.load_gate.lock().await;
        let reload = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.inner.load(true).await }
        });
        let host = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.load().await }
        });
        tokio::task::yield_now().await;
        drop(gate);

        let (outcome, version) = reload.await.unwrap().unwrap();
        host.await.unwrap().unwrap();

        assert_eq!(outcome, ReloadOutcome::Published);
        assert_eq!(provider.version(), 3);
        assert_eq!(version, 2);
        assert_eq!(provider.snapshot().get("a"), Some("2"));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_skips_policy() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/a", "1");
        let source = KvConfigSource::builder("app")
            .with_parser(TextValueParser)
            .on_load_exception(|ctx| ctx.ignore = true)
            .build();
        let provider = KvConfigProvider::new(source, store).unwrap();

        provider.dispose().await;
        let err = provider.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Cancelled));
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.put("app/a", "1");
        let source = KvConfigSource::builder("app")
            .with_parser(TextValueParser)
            .reload_on_change(true)
            .build();
        let provider = KvConfigProvider::new(source, store).unwrap();
        assert!(provider.is_polling());

        assert!(provider.dispose().await);
        assert!(provider.dispose().await);
        assert!(!provider.is_polling());
    }
}
