//! Core provider types.

mod merge;
mod policy;
mod provider;
mod snapshot;
mod source;

pub use policy::{LoadExceptionContext, LoadExceptionHandler, WatchErrorFn, WatchErrorHandler};
pub use provider::KvConfigProvider;
pub use snapshot::ConfigSnapshot;
pub use source::{DEFAULT_DISPOSE_TIMEOUT, KvConfigSource, KvConfigSourceBuilder, KvSourceSettings};
