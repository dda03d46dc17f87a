//! Store client trait.

use super::KvEntry;
use crate::core::WatchErrorFn;
use crate::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Capability the provider uses to read and watch a key prefix.
///
/// Implementations own the wire protocol. Both methods receive the
/// provider's cancellation token and should return promptly once it fires.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch every entry under `prefix`.
    ///
    /// Returns `Ok(None)` when the prefix holds no data. Connectivity
    /// failures are reported as
    /// [`ConfigError::Transport`](crate::error::ConfigError::Transport).
    async fn fetch(&self, prefix: &str, cancel: &CancellationToken)
    -> Result<Option<Vec<KvEntry>>>;

    /// Wait until the data under `prefix` changes or `cancel` fires.
    ///
    /// Recoverable failures while waiting are passed to `on_error` and the
    /// wait continues; this method never fails.
    async fn await_change(
        &self,
        prefix: &str,
        on_error: &WatchErrorFn<'_>,
        cancel: &CancellationToken,
    );

    /// Human-readable name for logging.
    fn name(&self) -> String {
        "store".to_string()
    }
}
