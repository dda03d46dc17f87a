//! Built-in metrics for provider load attempts.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Load attempts, successes, failures and ignored failures
//! - Load duration
//! - Keys in the published snapshot
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_kv_config::prelude::*;
//! use hotswap_kv_config::parsers::JsonValueParser;
//! use opentelemetry::global;
//!
//! let source = KvConfigSource::builder("app/settings")
//!     .with_parser(JsonValueParser)
//!     .with_metrics(global::meter("my-app"))
//!     .build();
//! ```

mod provider_metrics;

pub use provider_metrics::ProviderMetrics;
