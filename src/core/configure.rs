//! The orchestrator: registration, load ordering, initial loads, and push routing.

use crate::core::context::Context;
use crate::core::option::Scheme;
use crate::core::topology::{Dependent, topological_sort};
use crate::core::unit::{DynUnit, RegisteredUnit};
use crate::drivers::Driver;
use crate::error::{ConfigError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "metrics")]
use crate::metrics::UnitMetrics;
#[cfg(feature = "metrics")]
use std::time::Instant;

/// Loads every unit from its driver in dependency order and routes hot
/// upgrades pushed by drivers back to the owning unit.
///
/// Build one with [`Configure::builder`], then hand all units to
/// [`Configure::listen`] exactly once.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "json")]
/// # {
/// use std::sync::Arc;
/// use unitconf::prelude::*;
/// use unitconf::drivers::MemoryDriver;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct LoggerConfig {
///     file: String,
/// }
///
/// #[derive(Default)]
/// struct Logger {
///     config: Slot<LoggerConfig>,
/// }
///
/// impl Unit for Logger {
///     type Config = LoggerConfig;
///
///     fn option(&self) -> UnitOption<LoggerConfig> {
///         UnitOption::new("logger").with_parser(Json)
///     }
///
///     fn slot(&self) -> &Slot<LoggerConfig> {
///         &self.config
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let driver = MemoryDriver::new("memory");
/// driver.insert("logger", r#"{"file": "app.log"}"#);
///
/// let logger = Arc::new(Logger::default());
/// let configure = Configure::builder(driver).build()?;
/// let units: Vec<Arc<dyn DynUnit>> = vec![logger.clone()];
/// configure.listen(units)?;
///
/// assert_eq!(logger.config.get().file, "app.log");
/// configure.close();
/// # Ok(())
/// # }
/// # main().unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct Configure {
    shared: Arc<Shared>,
}

/// Options collected by the builder.
pub(crate) struct Settings {
    pub(crate) tolerate_first_failure: bool,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<UnitMetrics>,
}

/// State shared between the orchestrator handle and every driver [`Context`].
pub(crate) struct Shared {
    /// Default driver first, then additional drivers in insertion order.
    drivers: Vec<DriverBinding>,
    by_name: HashMap<String, usize>,
    tolerate_first_failure: bool,
    /// Set once the first `listen` call begins; held for its whole duration.
    listened: Mutex<bool>,
    /// Mirrors `listened` without taking the gate.
    listening: AtomicBool,
    keys: RwLock<HashSet<String>>,
    order: RwLock<Vec<String>>,
    #[cfg(feature = "metrics")]
    metrics: Option<UnitMetrics>,
}

struct DriverBinding {
    driver: Arc<dyn Driver>,
    state: RwLock<BindingState>,
}

#[derive(Default)]
struct BindingState {
    /// Whether at least one bound unit accepts hot upgrades.
    hot_upgrade: bool,
    units: HashMap<String, Arc<RegisteredUnit>>,
    /// Registration order, used to build deterministic contexts.
    sequence: Vec<String>,
}

#[derive(Clone)]
struct LoadStep {
    driver: usize,
    unit: Arc<RegisteredUnit>,
}

impl Dependent for LoadStep {
    fn key(&self) -> &str {
        &self.unit.key
    }

    fn pre_units(&self) -> &[String] {
        &self.unit.pre_units
    }
}

impl Configure {
    /// Create a builder whose default driver is `driver`.
    pub fn builder<D: Driver + 'static>(driver: D) -> crate::core::ConfigureBuilder {
        crate::core::ConfigureBuilder::new(driver)
    }

    pub(crate) fn from_parts(drivers: Vec<Arc<dyn Driver>>, settings: Settings) -> Self {
        let by_name = drivers
            .iter()
            .enumerate()
            .map(|(index, driver)| (driver.name().to_string(), index))
            .collect();
        let drivers = drivers
            .into_iter()
            .map(|driver| DriverBinding {
                driver,
                state: RwLock::new(BindingState::default()),
            })
            .collect();

        Self {
            shared: Arc::new(Shared {
                drivers,
                by_name,
                tolerate_first_failure: settings.tolerate_first_failure,
                listened: Mutex::new(false),
                listening: AtomicBool::new(false),
                keys: RwLock::new(HashSet::new()),
                order: RwLock::new(Vec::new()),
                #[cfg(feature = "metrics")]
                metrics: settings.metrics,
            }),
        }
    }

    /// Register, order, and load `units`, then start every driver that has
    /// at least one hot-upgrade unit.
    ///
    /// Only the first call does any work. Concurrent callers block until it
    /// finishes; every later call returns `Ok(())` without side effects, even
    /// if the first call failed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A unit has an empty key, no parser, a duplicate key, or names an
    ///   unknown driver
    /// - A prerequisite is unknown or the prerequisites form a cycle
    /// - A unit fails to fetch, hook, or decode (unless tolerating failures)
    /// - A driver fails to start; drivers already started are stopped
    pub fn listen<I>(&self, units: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn DynUnit>>,
    {
        let mut listened = self.shared.listened.lock();
        if *listened {
            tracing::debug!("listen already ran, ignoring");
            return Ok(());
        }
        *listened = true;
        self.shared.listening.store(true, Ordering::Release);

        let steps = self.register(units)?;
        let steps = {
            let keys = self.shared.keys.read();
            topological_sort(&steps, &keys)?
        };
        *self.shared.order.write() = steps.iter().map(|step| step.unit.key.clone()).collect();
        tracing::debug!(order = ?self.shared.order.read(), "resolved unit load order");

        for step in &steps {
            if let Err(err) = self.shared.load(step) {
                if !self.shared.tolerate_first_failure {
                    return Err(err);
                }
                tracing::warn!(unit = %step.unit.key, error = %err, "unit failed to load, continuing");
            }
        }

        self.start_drivers()
    }

    /// Stop every registered driver, started or not.
    pub fn close(&self) {
        for binding in &self.shared.drivers {
            binding.driver.stop();
        }
        tracing::debug!("all drivers stopped");
    }

    /// Unit keys in the order they were loaded. Empty until `listen` sorts.
    pub fn load_order(&self) -> Vec<String> {
        self.shared.order.read().clone()
    }

    /// Names of all registered drivers, default first.
    pub fn driver_names(&self) -> Vec<String> {
        self.shared
            .drivers
            .iter()
            .map(|binding| binding.driver.name().to_string())
            .collect()
    }

    /// Whether `listen` has been called.
    pub fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::Acquire)
    }

    fn register<I>(&self, units: I) -> Result<Vec<LoadStep>>
    where
        I: IntoIterator<Item = Arc<dyn DynUnit>>,
    {
        let mut keys = self.shared.keys.write();
        let mut steps = Vec::new();

        for unit in units {
            let unit = unit.bind()?;
            if keys.contains(&unit.key) {
                return Err(ConfigError::UnitExists(unit.key));
            }
            let driver = match &unit.driver_name {
                None => 0,
                Some(name) => *self
                    .shared
                    .by_name
                    .get(name)
                    .ok_or_else(|| ConfigError::DriverNotFound(name.clone()))?,
            };

            let unit = Arc::new(unit);
            {
                let mut state = self.shared.drivers[driver].state.write();
                state.hot_upgrade |= unit.hot_upgrade;
                state.units.insert(unit.key.clone(), Arc::clone(&unit));
                state.sequence.push(unit.key.clone());
            }
            keys.insert(unit.key.clone());
            tracing::debug!(
                unit = %unit.key,
                driver = %self.shared.drivers[driver].driver.name(),
                hot_upgrade = unit.hot_upgrade,
                "registered unit"
            );
            steps.push(LoadStep { driver, unit });
        }

        Ok(steps)
    }

    fn start_drivers(&self) -> Result<()> {
        let mut started: Vec<&Arc<dyn Driver>> = Vec::new();

        for binding in &self.shared.drivers {
            let schemes: HashMap<String, Scheme> = {
                let state = binding.state.read();
                if !state.hot_upgrade {
                    continue;
                }
                state
                    .sequence
                    .iter()
                    .filter_map(|key| state.units.get(key))
                    .filter(|unit| unit.hot_upgrade)
                    .map(|unit| (unit.key.clone(), unit.schemes.clone()))
                    .collect()
            };

            let name = binding.driver.name().to_string();
            let ctx = Context::new(name.clone(), schemes, Arc::downgrade(&self.shared));
            if let Err(err) = binding.driver.start(ctx) {
                for driver in started {
                    driver.stop();
                }
                tracing::warn!(driver = %name, error = %err, "driver failed to start, rolled back");
                return Err(ConfigError::DriverStart {
                    driver: name,
                    source: Box::new(err),
                });
            }
            tracing::info!(driver = %name, "driver started");
            started.push(&binding.driver);
        }

        Ok(())
    }
}

impl Shared {
    /// Initial load: fetch, pre-hook, decode, post-hook.
    ///
    /// Hooks run only when flagged to run on load.
    fn load(&self, step: &LoadStep) -> Result<()> {
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let result = self.load_inner(step);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_load(&step.unit.key, started, result.is_ok());
        }
        result
    }

    fn load_inner(&self, step: &LoadStep) -> Result<()> {
        let unit = &step.unit;
        let driver = &self.drivers[step.driver].driver;

        let buf = driver.fetch(&unit.key, &unit.schemes)?;
        if let Some(hook) = unit.before.as_ref().filter(|hook| hook.run_on_load) {
            hook.call()?;
        }
        unit.decode(&buf)?;
        if let Some(hook) = unit.after.as_ref().filter(|hook| hook.run_on_load) {
            hook.call()?;
        }

        tracing::info!(unit = %unit.key, driver = %driver.name(), "unit loaded");
        Ok(())
    }

    /// Apply bytes pushed by `driver` for `key`.
    ///
    /// Unknown drivers or keys are dropped. Hooks always run on this path;
    /// failures go to the unit's error handler and stop the upgrade.
    pub(crate) fn push(&self, driver: &str, key: &str, buf: &[u8]) {
        let unit = self
            .by_name
            .get(driver)
            .and_then(|&index| self.drivers[index].state.read().units.get(key).cloned());
        let Some(unit) = unit else {
            tracing::debug!(driver = %driver, unit = %key, "dropping push for unknown unit");
            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.record_push_dropped(driver);
            }
            return;
        };

        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let result = Self::upgrade(&unit, buf);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_push(&unit.key, started, result.is_ok());
        }

        match result {
            Ok(()) => tracing::info!(unit = %unit.key, driver = %driver, "hot upgrade applied"),
            Err(err) => unit.report(err),
        }
    }

    fn upgrade(unit: &RegisteredUnit, buf: &[u8]) -> Result<()> {
        if let Some(hook) = &unit.before {
            hook.call()?;
        }
        unit.decode(buf)?;
        if let Some(hook) = &unit.after {
            hook.call()?;
        }
        Ok(())
    }
}
