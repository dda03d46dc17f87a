//! Key-value store abstractions.
//!
//! The provider talks to the store only through [`StoreClient`]. A network
//! client for a real store (Consul, etcd, ...) lives outside this crate;
//! [`MemoryStore`] is an in-process implementation for tests and demos.

mod client;
mod entry;
mod memory;

pub use client::StoreClient;
pub use entry::KvEntry;
pub use memory::MemoryStore;
