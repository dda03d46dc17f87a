//! Example demonstrating the load-exception policy.
//!
//! This example shows how to:
//! - Let an optional source start while the store is down
//! - Inspect failures and decide which ones to ignore
//! - Keep the last-known-good snapshot when a reload fails
//!
//! Run with: cargo run --example load_exceptions

use hotswap_kv_config::parsers::TextValueParser;
use hotswap_kv_config::prelude::*;
use hotswap_kv_config::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotswap_kv_config=info".into()),
        )
        .init();

    println!("=== Load Exception Example ===\n");

    let store = Arc::new(MemoryStore::new());
    store.put("feature-flags/checkout", "enabled");
    store.set_unavailable(true);

    // Ignore connectivity failures, surface everything else.
    let source = KvConfigSource::builder("feature-flags")
        .with_parser(TextValueParser)
        .optional(true)
        .reload_on_change(true)
        .on_load_exception(|ctx| {
            println!(
                "[Policy] {} failure on '{}' (reloading: {}): {}",
                ctx.kind(),
                ctx.key(),
                ctx.is_reloading(),
                ctx.error()
            );
            ctx.ignore = ctx.kind() == ErrorKind::Transport || ctx.is_reloading();
        })
        .on_watch_error(|err| println!("[Watch] {}", err))
        .build();

    let provider = KvConfigProvider::new(source, store.clone())?;
    provider.load().await?;
    println!("Started with {} flags while the store was down\n", provider.snapshot().len());

    let _subscription = provider.subscribe(|event| {
        println!("[Event] reload outcome {:?}, version {}", event.outcome, event.version);
    });

    store.set_unavailable(false);
    store.put("feature-flags/checkout", "enabled");
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("checkout = {:?}", provider.get("checkout"));

    // Invalid UTF-8: the reload fails, the policy ignores it, the old value stays.
    store.put("feature-flags/checkout", vec![0xffu8, 0xfe]);
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("checkout = {:?}", provider.get("checkout"));

    provider.dispose().await;
    Ok(())
}
