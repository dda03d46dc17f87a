//! Subscriber-based notifications for background reloads.

use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

type Callback = Arc<dyn Fn(&ReloadEvent) + Send + Sync>;

/// What a background reload attempt did to the published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new snapshot was published.
    Published,
    /// The store had no data for a mandatory key; the previous snapshot was kept.
    Unchanged,
    /// The attempt failed and the load-exception handler chose to ignore it.
    Ignored,
}

/// Payload delivered to subscribers after a background reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    /// The watched key that was reloaded
    pub key: String,
    /// Version of the snapshot published after the attempt
    pub version: u64,
    /// What the attempt did
    pub outcome: ReloadOutcome,
}

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
pub struct SubscriptionHandle {
    id: usize,
    registry: Arc<RwLock<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let id = self.id;
        self.registry
            .write()
            .subscribers
            .retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
}

/// Registry of reload callbacks.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::notify::{ReloadEvent, ReloadOutcome, SubscriberRegistry};
///
/// let registry = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|event| {
///     println!("reloaded {} -> v{}", event.key, event.version);
/// });
///
/// registry.notify_all(&ReloadEvent {
///     key: "app".to_string(),
///     version: 1,
///     outcome: ReloadOutcome::Published,
/// });
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<RwLock<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a callback for reload events.
    ///
    /// Returns a handle that can be dropped to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ReloadEvent) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Invoke every callback in subscription order.
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// drop handles themselves. A panicking callback is logged and the rest
    /// still run.
    pub fn notify_all(&self, event: &ReloadEvent) {
        let callbacks: Vec<Callback> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(
                    key = %event.key,
                    version = event.version,
                    "Reload subscriber panicked"
                );
            }
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
