//! Configuration surface for a key-value source.

use crate::core::{LoadExceptionContext, LoadExceptionHandler, WatchErrorHandler};
use crate::error::{ConfigError, Result};
use crate::parsers::ValueParser;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::ProviderMetrics;

/// Default bounded wait for the poll task to stop on dispose.
pub const DEFAULT_DISPOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Everything a [`KvConfigProvider`](crate::core::KvConfigProvider) needs to
/// know about the key it serves.
///
/// Build one with [`KvConfigSource::builder`].
#[derive(Clone)]
pub struct KvConfigSource {
    pub(crate) watch_key: String,
    pub(crate) key_to_remove: Option<String>,
    pub(crate) optional: bool,
    pub(crate) reload_on_change: bool,
    pub(crate) dispose_timeout: Duration,
    pub(crate) parser: Option<Arc<dyn ValueParser>>,
    pub(crate) on_load_exception: Option<LoadExceptionHandler>,
    pub(crate) on_watch_error: Option<WatchErrorHandler>,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<ProviderMetrics>,
}

impl KvConfigSource {
    /// Start building a source for `watch_key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hotswap_kv_config::core::KvConfigSource;
    /// use hotswap_kv_config::parsers::TextValueParser;
    ///
    /// let source = KvConfigSource::builder("app/settings")
    ///     .with_parser(TextValueParser)
    ///     .optional(true)
    ///     .reload_on_change(true)
    ///     .on_load_exception(|ctx| ctx.ignore = true)
    ///     .build();
    ///
    /// assert_eq!(source.key_to_remove(), "app/settings");
    /// ```
    pub fn builder(watch_key: impl Into<String>) -> KvConfigSourceBuilder {
        KvConfigSourceBuilder::new(watch_key)
    }

    /// Start building a source pre-filled from deserialized settings.
    pub fn from_settings(settings: KvSourceSettings) -> KvConfigSourceBuilder {
        let mut builder = KvConfigSourceBuilder::new(settings.watch_key)
            .optional(settings.optional)
            .reload_on_change(settings.reload_on_change)
            .with_dispose_timeout(Duration::from_millis(settings.dispose_timeout_ms));
        if let Some(key_to_remove) = settings.key_to_remove {
            builder = builder.with_key_to_remove(key_to_remove);
        }
        builder
    }

    /// The key prefix fetched and watched.
    pub fn watch_key(&self) -> &str {
        &self.watch_key
    }

    /// The prefix stripped from entry keys; defaults to the watch key.
    pub fn key_to_remove(&self) -> &str {
        self.key_to_remove.as_deref().unwrap_or(&self.watch_key)
    }

    /// Whether missing data is tolerated on the initial load.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether a background poll task keeps the snapshot current.
    pub fn reload_on_change(&self) -> bool {
        self.reload_on_change
    }

    /// Bounded wait used by `dispose`.
    pub fn dispose_timeout(&self) -> Duration {
        self.dispose_timeout
    }
}

impl fmt::Debug for KvConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvConfigSource")
            .field("watch_key", &self.watch_key)
            .field("key_to_remove", &self.key_to_remove)
            .field("optional", &self.optional)
            .field("reload_on_change", &self.reload_on_change)
            .field("dispose_timeout", &self.dispose_timeout)
            .field("has_parser", &self.parser.is_some())
            .field("has_load_exception_handler", &self.on_load_exception.is_some())
            .finish()
    }
}

/// Builder for [`KvConfigSource`].
///
/// Nothing is validated here; a source without a parser is rejected when
/// the provider is constructed.
pub struct KvConfigSourceBuilder {
    source: KvConfigSource,
}

impl KvConfigSourceBuilder {
    /// Create a builder with default settings: mandatory, no reload, no parser.
    pub fn new(watch_key: impl Into<String>) -> Self {
        Self {
            source: KvConfigSource {
                watch_key: watch_key.into(),
                key_to_remove: None,
                optional: false,
                reload_on_change: false,
                dispose_timeout: DEFAULT_DISPOSE_TIMEOUT,
                parser: None,
                on_load_exception: None,
                on_watch_error: None,
                #[cfg(feature = "metrics")]
                metrics: None,
            },
        }
    }

    /// Strip this prefix from entry keys instead of the watch key.
    pub fn with_key_to_remove(mut self, key_to_remove: impl Into<String>) -> Self {
        self.source.key_to_remove = Some(key_to_remove.into());
        self
    }

    /// Tolerate missing data on the initial load.
    pub fn optional(mut self, optional: bool) -> Self {
        self.source.optional = optional;
        self
    }

    /// Start a background task that reloads whenever the key changes.
    pub fn reload_on_change(mut self, reload_on_change: bool) -> Self {
        self.source.reload_on_change = reload_on_change;
        self
    }

    /// Set the parser used for every stored value.
    pub fn with_parser<P: ValueParser + 'static>(mut self, parser: P) -> Self {
        self.source.parser = Some(Arc::new(parser));
        self
    }

    /// Set a shared parser.
    pub fn with_shared_parser(mut self, parser: Arc<dyn ValueParser>) -> Self {
        self.source.parser = Some(parser);
        self
    }

    /// Install the load-exception handler.
    ///
    /// The handler runs once per failed load attempt and may set
    /// `ctx.ignore = true` to suppress the failure.
    /// If the handler panics, the panic is logged and the failure is not
    /// ignored.
    pub fn on_load_exception<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut LoadExceptionContext) + Send + Sync + 'static,
    {
        self.source.on_load_exception = Some(Arc::new(handler));
        self
    }

    /// Install a handler for recoverable errors reported while watching.
    pub fn on_watch_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ConfigError) + Send + Sync + 'static,
    {
        self.source.on_watch_error = Some(Arc::new(handler));
        self
    }

    /// Override the bounded wait used by `dispose` (default 500ms).
    pub fn with_dispose_timeout(mut self, timeout: Duration) -> Self {
        self.source.dispose_timeout = timeout;
        self
    }

    /// Record load metrics on the given meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.source.metrics = Some(ProviderMetrics::new(meter));
        self
    }

    /// Finish building.
    pub fn build(self) -> KvConfigSource {
        self.source
    }
}

/// Serializable subset of [`KvConfigSource`], for loading provider settings
/// from files or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KvSourceSettings {
    /// Key prefix to fetch and watch
    pub watch_key: String,
    /// Prefix to strip from entry keys
    #[serde(default)]
    pub key_to_remove: Option<String>,
    /// Tolerate missing data on the initial load
    #[serde(default)]
    pub optional: bool,
    /// Keep the snapshot current with a background poll task
    #[serde(default)]
    pub reload_on_change: bool,
    /// Bounded wait used by `dispose`, in milliseconds
    #[serde(default = "default_dispose_timeout_ms")]
    pub dispose_timeout_ms: u64,
}

fn default_dispose_timeout_ms() -> u64 {
    DEFAULT_DISPOSE_TIMEOUT.as_millis() as u64
}

impl KvSourceSettings {
    /// Deserialize settings from a built `config::Config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if `watch_key` is missing or a
    /// value has the wrong type.
    pub fn from_config(config: config::Config) -> Result<Self> {
        Ok(config.try_deserialize()?)
    }

    /// Read settings from `{PREFIX}_WATCH_KEY`, `{PREFIX}_OPTIONAL`, ...
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use hotswap_kv_config::core::KvSourceSettings;
    ///
    /// // APP_KV_WATCH_KEY=app/settings APP_KV_RELOAD_ON_CHANGE=true
    /// let settings = KvSourceSettings::from_env("APP_KV").unwrap();
    /// ```
    pub fn from_env(prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix).try_parsing(true))
            .build()?;
        Self::from_config(config)
    }
}
