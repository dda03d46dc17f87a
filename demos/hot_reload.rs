//! Example demonstrating background reloads from a watched key prefix.
//!
//! This example shows how to:
//! - Serve a key prefix as a flat configuration snapshot
//! - Reload automatically when the store reports a change
//! - Subscribe to reload notifications
//!
//! Run with: cargo run --example hot_reload
//!
//! A writer task stands in for an operator editing the store.

use hotswap_kv_config::parsers::JsonValueParser;
use hotswap_kv_config::prelude::*;
use hotswap_kv_config::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotswap_kv_config=debug".into()),
        )
        .init();

    println!("=== Hot Reload Example ===\n");

    let store = Arc::new(MemoryStore::new());
    store.put(
        "services/api/appsettings",
        r#"{"server": {"host": "localhost", "port": 8080}, "database": {"max_connections": 10}}"#,
    );

    let source = KvConfigSource::builder("services/api")
        .with_parser(JsonValueParser)
        .reload_on_change(true)
        .build();
    let provider = KvConfigProvider::new(source, store.clone())?;
    provider.load().await?;

    let _subscription = provider.subscribe(|event| {
        println!(
            "\n[Event] {} reloaded: {:?} (version {})",
            event.key, event.outcome, event.version
        );
    });

    print_snapshot(&provider.snapshot());

    // Simulate operators editing the store
    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for port in [9090, 9191, 9292] {
                tokio::time::sleep(Duration::from_secs(1)).await;
                store.put(
                    "services/api/appsettings",
                    format!(
                        r#"{{"server": {{"host": "0.0.0.0", "port": {}}}, "database": {{"max_connections": 20}}}}"#,
                        port
                    ),
                );
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
            store.delete("services/api/appsettings");
        })
    };

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(1100)).await;
        print_snapshot(&provider.snapshot());
    }

    let _ = writer.await;
    let stopped = provider.dispose().await;
    println!("\nPoll task stopped cleanly: {}", stopped);

    Ok(())
}

fn print_snapshot(snapshot: &ConfigSnapshot) {
    println!("[Status] Snapshot version {}:", snapshot.version());
    for (key, value) in snapshot.to_map() {
        println!("  {} = {}", key, value);
    }
}
