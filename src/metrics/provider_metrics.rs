//! Load metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for provider load attempts.
///
/// Every attempt, initial or background, is counted once as a success, a
/// failure or an ignored failure.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_kv_config::metrics::ProviderMetrics;
/// use opentelemetry::global;
///
/// let metrics = ProviderMetrics::new(global::meter("hotswap-kv-config"));
///
/// let timer = metrics.start_load();
/// // ... fetch, parse, publish ...
/// metrics.record_load_success(timer, 12);
/// ```
#[derive(Clone)]
pub struct ProviderMetrics {
    load_attempts: Counter<u64>,
    load_success: Counter<u64>,
    load_failures: Counter<u64>,
    load_ignored: Counter<u64>,
    load_duration: Histogram<f64>,
    snapshot_keys: Gauge<u64>,
}

impl ProviderMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let load_attempts = meter
            .u64_counter("hotswap_kv_config.load.attempts")
            .with_description("Total number of load attempts")
            .build();

        let load_success = meter
            .u64_counter("hotswap_kv_config.load.success")
            .with_description("Number of load attempts that completed")
            .build();

        let load_failures = meter
            .u64_counter("hotswap_kv_config.load.failures")
            .with_description("Number of failed load attempts")
            .build();

        let load_ignored = meter
            .u64_counter("hotswap_kv_config.load.ignored")
            .with_description("Number of failed load attempts suppressed by the exception handler")
            .build();

        let load_duration = meter
            .f64_histogram("hotswap_kv_config.load.duration")
            .with_description("Duration of load attempts in seconds")
            .with_unit("s")
            .build();

        let snapshot_keys = meter
            .u64_gauge("hotswap_kv_config.snapshot.keys")
            .with_description("Number of keys in the published snapshot")
            .build();

        Self {
            load_attempts,
            load_success,
            load_failures,
            load_ignored,
            load_duration,
            snapshot_keys,
        }
    }

    /// Start timing a load attempt.
    ///
    /// Pass the returned `Instant` to one of the `record_*` methods.
    pub fn start_load(&self) -> Instant {
        self.load_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a completed attempt and the size of the current snapshot.
    pub fn record_load_success(&self, start: Instant, keys: usize) {
        self.load_success.add(1, &[]);
        self.load_duration.record(start.elapsed().as_secs_f64(), &[]);
        self.snapshot_keys.record(keys as u64, &[]);
    }

    /// Record a failed attempt.
    pub fn record_load_failure(&self, start: Instant) {
        self.load_failures.add(1, &[]);
        self.load_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a failed attempt the exception handler chose to ignore.
    pub fn record_load_ignored(&self, start: Instant) {
        self.load_ignored.add(1, &[]);
        self.load_duration.record(start.elapsed().as_secs_f64(), &[]);
    }
}
