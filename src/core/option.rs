//! Static loading policy declared by each unit.

use crate::error::{ConfigError, Result};
use crate::parser::Parser;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque per-unit hints handed to a driver, e.g. a file suffix.
pub type Scheme = HashMap<String, config::Value>;

/// Lock a caller can share with its own code to serialize slot writes.
pub type SlotLock = Arc<Mutex<()>>;

pub(crate) type HookFn = Arc<dyn Fn() -> Result<()> + Send + Sync>;
pub(crate) type ErrorHandler = Arc<dyn Fn(ConfigError) + Send + Sync>;

/// A pre or post hook around the decode step.
#[derive(Clone)]
pub struct Hook {
    pub(crate) func: HookFn,
    /// Whether the initial load runs this hook. Hot upgrades always do.
    pub(crate) run_on_load: bool,
}

impl Hook {
    pub(crate) fn call(&self) -> Result<()> {
        (self.func)()
    }

    /// Whether the initial load runs this hook.
    pub fn runs_on_load(&self) -> bool {
        self.run_on_load
    }
}

/// Declares how a unit is loaded: its key, parser, driver binding, and hooks.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "json")]
/// # {
/// use unitconf::core::UnitOption;
/// use unitconf::parser::Json;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct DbConfig {
///     host: String,
///     port: u16,
/// }
///
/// let option = UnitOption::<DbConfig>::new("dba")
///     .with_parser(Json)
///     .with_driver("dir")
///     .with_scheme("suffix", ".json")
///     .hot_upgrade(true)
///     .after(|| Ok(()), true);
///
/// assert_eq!(option.key(), "dba");
/// assert_eq!(option.driver_name(), Some("dir"));
/// # }
/// ```
pub struct UnitOption<T> {
    pub(crate) key: String,
    pub(crate) parser: Option<Arc<dyn Parser<T>>>,
    pub(crate) driver_name: Option<String>,
    pub(crate) hot_upgrade: bool,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) lock: Option<SlotLock>,
    pub(crate) before: Option<Hook>,
    pub(crate) after: Option<Hook>,
    pub(crate) schemes: Scheme,
}

impl<T> UnitOption<T> {
    /// Create an option for the unit identified by `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parser: None,
            driver_name: None,
            hot_upgrade: false,
            on_error: None,
            lock: None,
            before: None,
            after: None,
            schemes: Scheme::new(),
        }
    }

    /// Set the parser used to decode fetched bytes into the slot.
    pub fn with_parser<P>(mut self, parser: P) -> Self
    where
        P: Parser<T> + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Bind the unit to a named driver instead of the default one.
    ///
    /// An empty name keeps the default driver.
    pub fn with_driver(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.driver_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Opt in to (or out of) hot upgrades pushed by the driver.
    pub fn hot_upgrade(mut self, allow: bool) -> Self {
        self.hot_upgrade = allow;
        self
    }

    /// Handle errors raised while applying a hot upgrade.
    ///
    /// Initial-load errors are returned from `listen` and never reach this handler.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(ConfigError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Hold `lock` while decoding into the slot.
    pub fn with_lock(mut self, lock: SlotLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Run `hook` before decoding.
    ///
    /// `run_on_load` controls whether the initial load runs it; hot upgrades
    /// always do.
    pub fn before<F>(mut self, hook: F, run_on_load: bool) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Hook {
            func: Arc::new(hook),
            run_on_load,
        });
        self
    }

    /// Run `hook` after a successful decode.
    ///
    /// `run_on_load` controls whether the initial load runs it; hot upgrades
    /// always do.
    pub fn after<F>(mut self, hook: F, run_on_load: bool) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Hook {
            func: Arc::new(hook),
            run_on_load,
        });
        self
    }

    /// Set a single scheme entry.
    pub fn with_scheme(mut self, key: impl Into<String>, value: impl Into<config::Value>) -> Self {
        self.schemes.insert(key.into(), value.into());
        self
    }

    /// Merge `schemes` into the existing entries, overwriting duplicates.
    pub fn with_schemes(mut self, schemes: Scheme) -> Self {
        self.schemes.extend(schemes);
        self
    }

    /// The unit key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The bound driver name, `None` for the default driver.
    pub fn driver_name(&self) -> Option<&str> {
        self.driver_name.as_deref()
    }

    /// Whether the unit accepts hot upgrades.
    pub fn allows_hot_upgrade(&self) -> bool {
        self.hot_upgrade
    }

    /// The scheme entries handed to the driver.
    pub fn schemes(&self) -> &Scheme {
        &self.schemes
    }

    /// The hook run before decoding, if any.
    pub fn before_hook(&self) -> Option<&Hook> {
        self.before.as_ref()
    }

    /// The hook run after a successful decode, if any.
    pub fn after_hook(&self) -> Option<&Hook> {
        self.after.as_ref()
    }

    /// Whether a parser has been attached.
    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }
}

impl<T> fmt::Debug for UnitOption<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOption")
            .field("key", &self.key)
            .field("driver_name", &self.driver_name)
            .field("hot_upgrade", &self.hot_upgrade)
            .field("has_parser", &self.parser.is_some())
            .field("has_lock", &self.lock.is_some())
            .field("schemes", &self.schemes)
            .finish()
    }
}
