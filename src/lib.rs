//! # hotswap-kv-config
//!
//! Hot-reloaded flat configuration backed by a watched remote key-value store.
//!
//! ## Overview
//!
//! `hotswap-kv-config` exposes every value stored under a key prefix (in
//! Consul, etcd or any store behind [`store::StoreClient`]) as one flat,
//! case-insensitive configuration map, and keeps that map current:
//! - Lock-free reads of an immutable snapshot using `arc-swap`
//! - A background poll task that blocks until the prefix changes, then reloads
//! - Last-known-good semantics: failed reloads never replace the snapshot
//! - A load-exception handler that can mark failures as ignorable
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_kv_config::prelude::*;
//! use hotswap_kv_config::parsers::JsonValueParser;
//! use hotswap_kv_config::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! store.put("app/settings", r#"{"server": {"port": 8080}}"#);
//!
//! let source = KvConfigSource::builder("app")
//!     .with_parser(JsonValueParser)
//!     .reload_on_change(true)
//!     .on_load_exception(|ctx| ctx.ignore = ctx.is_reloading())
//!     .build();
//!
//! let provider = KvConfigProvider::new(source, store)?;
//! provider.load().await?;
//!
//! let snapshot = provider.snapshot();
//! println!("Server port: {:?}", snapshot.get("settings:server:port"));
//!
//! let _handle = provider.subscribe(|event| {
//!     println!("reloaded to version {}", event.version);
//! });
//!
//! // At shutdown
//! provider.dispose().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `json` (default): [`parsers::JsonValueParser`]
//! - `yaml`: [`parsers::YamlValueParser`]
//! - `metrics`: OpenTelemetry load metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod parsers;
pub mod store;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        ConfigSnapshot, KvConfigProvider, KvConfigSource, KvConfigSourceBuilder,
        LoadExceptionContext,
    };
    pub use crate::error::{ConfigError, ErrorKind, Result};
    pub use crate::notify::{ReloadEvent, ReloadOutcome};
    pub use crate::parsers::ValueParser;
    pub use crate::store::{KvEntry, StoreClient};
}
