//! Unit metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for unit loads and pushes.
///
/// Every instrument is tagged with the `unit` it concerns, except
/// `unitconf.push.dropped`, which is tagged with the `driver` that pushed.
///
/// # Examples
///
/// ```rust,no_run
/// use unitconf::metrics::UnitMetrics;
/// use opentelemetry::global;
/// use std::time::Instant;
///
/// let metrics = UnitMetrics::new(global::meter("unitconf"));
///
/// let started = Instant::now();
/// // ... fetch and decode ...
/// metrics.record_load("logger", started, true);
/// ```
#[derive(Clone)]
pub struct UnitMetrics {
    load_success: Counter<u64>,
    load_failures: Counter<u64>,
    push_received: Counter<u64>,
    push_dropped: Counter<u64>,
    push_failures: Counter<u64>,
    apply_duration: Histogram<f64>,
}

impl UnitMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let load_success = meter
            .u64_counter("unitconf.load.success")
            .with_description("Number of units loaded at startup")
            .build();

        let load_failures = meter
            .u64_counter("unitconf.load.failures")
            .with_description("Number of units that failed to load at startup")
            .build();

        let push_received = meter
            .u64_counter("unitconf.push.received")
            .with_description("Number of pushes routed to a unit")
            .build();

        let push_dropped = meter
            .u64_counter("unitconf.push.dropped")
            .with_description("Number of pushes for unknown drivers or units")
            .build();

        let push_failures = meter
            .u64_counter("unitconf.push.failures")
            .with_description("Number of pushes that failed to apply")
            .build();

        let apply_duration = meter
            .f64_histogram("unitconf.apply.duration")
            .with_description("Time spent loading or upgrading a unit in seconds")
            .with_unit("s")
            .build();

        Self {
            load_success,
            load_failures,
            push_received,
            push_dropped,
            push_failures,
            apply_duration,
        }
    }

    /// Record the outcome of an initial load that began at `started`.
    pub fn record_load(&self, unit: &str, started: Instant, ok: bool) {
        let attrs = [KeyValue::new("unit", unit.to_string())];
        if ok {
            self.load_success.add(1, &attrs);
        } else {
            self.load_failures.add(1, &attrs);
        }
        self.apply_duration
            .record(started.elapsed().as_secs_f64(), &attrs);
    }

    /// Record the outcome of a push that began at `started`.
    pub fn record_push(&self, unit: &str, started: Instant, ok: bool) {
        let attrs = [KeyValue::new("unit", unit.to_string())];
        self.push_received.add(1, &attrs);
        if !ok {
            self.push_failures.add(1, &attrs);
        }
        self.apply_duration
            .record(started.elapsed().as_secs_f64(), &attrs);
    }

    /// Record a push that matched no bound unit.
    pub fn record_push_dropped(&self, driver: &str) {
        self.push_dropped
            .add(1, &[KeyValue::new("driver", driver.to_string())]);
    }
}
