//! OpenTelemetry metrics for unit loads and hot upgrades.
//!
//! Tracks:
//! - Initial load successes and failures per unit
//! - Pushes received, dropped, and failed
//! - How long applying a unit takes
//!
//! # Examples
//!
//! ```rust,no_run
//! use unitconf::prelude::*;
//! use unitconf::drivers::MemoryDriver;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let configure = Configure::builder(MemoryDriver::new("memory"))
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod unit_metrics;

pub use unit_metrics::UnitMetrics;
