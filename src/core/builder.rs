//! Builder for constructing Configure instances.

use crate::core::Configure;
use crate::core::configure::Settings;
use crate::drivers::Driver;
use crate::error::{ConfigError, Result};
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::UnitMetrics;

/// Builder for constructing a [`Configure`] instance.
///
/// The default driver is required up front; units that do not name a driver
/// are bound to it.
///
/// # Examples
///
/// ```rust
/// use unitconf::prelude::*;
/// use unitconf::drivers::MemoryDriver;
///
/// # fn example() -> Result<()> {
/// let configure = Configure::builder(MemoryDriver::new("memory"))
///     .with_driver(MemoryDriver::new("secrets"))
///     .tolerate_first_failure(true)
///     .build()?;
///
/// assert_eq!(configure.driver_names(), vec!["memory", "secrets"]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct ConfigureBuilder {
    default_driver: Arc<dyn Driver>,
    drivers: Vec<Arc<dyn Driver>>,
    tolerate_first_failure: bool,
    #[cfg(feature = "metrics")]
    metrics: Option<UnitMetrics>,
}

impl ConfigureBuilder {
    /// Create a new builder with `driver` as the default driver.
    pub fn new<D: Driver + 'static>(driver: D) -> Self {
        Self {
            default_driver: Arc::new(driver),
            drivers: Vec::new(),
            tolerate_first_failure: false,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Add another named driver that units can bind to by name.
    ///
    /// Names are checked in [`build`](Self::build): each must be non-empty
    /// and distinct from the default driver and every earlier driver.
    pub fn with_driver<D: Driver + 'static>(mut self, driver: D) -> Self {
        self.drivers.push(Arc::new(driver));
        self
    }

    /// Keep loading the remaining units when one fails during `listen`.
    ///
    /// Units that depend on the failed unit are still loaded.
    pub fn tolerate_first_failure(mut self, tolerate: bool) -> Self {
        self.tolerate_first_failure = tolerate;
        self
    }

    /// Record load and hot-upgrade metrics with the provided meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(UnitMetrics::new(meter));
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if any driver name is empty or used twice.
    pub fn build(self) -> Result<Configure> {
        let mut drivers = Vec::with_capacity(self.drivers.len() + 1);
        drivers.push(self.default_driver);
        drivers.extend(self.drivers);

        let mut names = HashSet::with_capacity(drivers.len());
        for driver in &drivers {
            let name = driver.name();
            if name.is_empty() {
                return Err(ConfigError::EmptyDriverName);
            }
            if !names.insert(name.to_string()) {
                return Err(ConfigError::DriverExists(name.to_string()));
            }
        }

        Ok(Configure::from_parts(
            drivers,
            Settings {
                tolerate_first_failure: self.tolerate_first_failure,
                #[cfg(feature = "metrics")]
                metrics: self.metrics,
            },
        ))
    }
}
