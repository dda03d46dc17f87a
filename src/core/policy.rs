//! Load failure policy.

use crate::error::{ConfigError, ErrorKind};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Callback deciding whether a failed load may be ignored.
pub type LoadExceptionHandler = Arc<dyn Fn(&mut LoadExceptionContext) + Send + Sync>;

/// Callback receiving recoverable errors reported while watching for changes.
pub type WatchErrorHandler = Arc<WatchErrorFn<'static>>;

/// Borrowed form of a watch-error callback, as passed to
/// [`StoreClient::await_change`](crate::store::StoreClient::await_change).
///
/// Spelled out as higher-ranked so implementations can report errors that
/// live on their own stack. `'a` bounds what the callback itself borrows.
pub type WatchErrorFn<'a> = dyn for<'e> Fn(&'e ConfigError) + Send + Sync + 'a;

/// Decision record handed to the load-exception handler.
///
/// A fresh context is built for every failed load attempt. The handler
/// inspects it and sets [`ignore`](Self::ignore) to suppress the failure;
/// otherwise the error is returned from `load()` or logged by the poll loop.
///
/// # Examples
///
/// ```rust
/// use hotswap_kv_config::core::LoadExceptionContext;
/// use hotswap_kv_config::error::{ConfigError, ErrorKind};
///
/// let handler = |ctx: &mut LoadExceptionContext| {
///     if ctx.kind() == ErrorKind::Transport {
///         ctx.ignore = true;
///     }
/// };
///
/// let mut ctx = LoadExceptionContext::new("app", false, ConfigError::Transport("refused".into()));
/// handler(&mut ctx);
/// assert!(ctx.ignore);
/// ```
#[derive(Debug)]
pub struct LoadExceptionContext {
    key: String,
    reloading: bool,
    error: ConfigError,
    /// Set to `true` to suppress the failure.
    pub ignore: bool,
}

impl LoadExceptionContext {
    /// Create a context for a failed attempt on `key`.
    pub fn new(key: impl Into<String>, reloading: bool, error: ConfigError) -> Self {
        Self {
            key: key.into(),
            reloading,
            error,
            ignore: false,
        }
    }

    /// The watched key whose load failed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `true` when the failure happened in a background reload.
    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// The originating failure.
    pub fn error(&self) -> &ConfigError {
        &self.error
    }

    /// Category of the originating failure.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Consume the context, returning the failure.
    pub fn into_error(self) -> ConfigError {
        self.error
    }
}

/// Run `handler` over a fresh context and return the error unless ignored.
pub(crate) fn apply_policy(
    handler: Option<&LoadExceptionHandler>,
    key: &str,
    reloading: bool,
    error: ConfigError,
) -> Option<ConfigError> {
    let mut ctx = LoadExceptionContext::new(key, reloading, error);
    if let Some(handler) = handler {
        if panic::catch_unwind(AssertUnwindSafe(|| handler(&mut ctx))).is_err() {
            tracing::error!(
                key = %key,
                reloading,
                "Load exception handler panicked; the failure will not be ignored"
            );
            ctx.ignore = false;
        }
    }

    if ctx.ignore {
        tracing::warn!(
            key = %ctx.key,
            reloading,
            kind = %ctx.kind(),
            error = %ctx.error,
            "Ignoring configuration load failure"
        );
        None
    } else {
        Some(ctx.into_error())
    }
}
