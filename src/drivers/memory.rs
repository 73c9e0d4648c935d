//! In-process driver backed by a map.

use super::Driver;
use crate::core::{Context, Scheme};
use crate::error::{ConfigError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

/// Driver that serves bytes from memory.
///
/// Useful for tests and for configuration assembled by the program itself.
/// Once started, [`MemoryDriver::publish`] pushes new bytes to the owning
/// unit as a hot upgrade.
///
/// # Examples
///
/// ```rust
/// use unitconf::drivers::{Driver, MemoryDriver};
/// use unitconf::core::Scheme;
///
/// let driver = MemoryDriver::new("memory");
/// driver.insert("logger", r#"{"file": "app.log"}"#);
///
/// let buf = driver.fetch("logger", &Scheme::new()).unwrap();
/// assert_eq!(buf, br#"{"file": "app.log"}"#);
/// ```
pub struct MemoryDriver {
    name: String,
    values: RwLock<HashMap<String, Vec<u8>>>,
    context: Mutex<Option<Context>>,
}

impl MemoryDriver {
    /// Create an empty driver called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(HashMap::new()),
            context: Mutex::new(None),
        }
    }

    /// Store `buf` under `key` without notifying anyone.
    pub fn insert(&self, key: impl Into<String>, buf: impl Into<Vec<u8>>) {
        self.values.write().insert(key.into(), buf.into());
    }

    /// Remove the bytes stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.values.write().remove(key)
    }

    /// Store `buf` under `key` and push it if the driver is started.
    ///
    /// Returns whether a push was delivered to the orchestrator.
    pub fn publish(&self, key: impl Into<String>, buf: impl Into<Vec<u8>>) -> bool {
        let key = key.into();
        let buf = buf.into();
        self.values.write().insert(key.clone(), buf.clone());

        // Clone the context so the push runs without holding our lock.
        let context = self.context.lock().clone();
        match context {
            Some(ctx) => {
                ctx.push_update(&key, &buf);
                true
            }
            None => false,
        }
    }

    /// The context received from the last `start`, if still running.
    pub fn context(&self) -> Option<Context> {
        self.context.lock().clone()
    }

    /// Whether the driver has been started and not stopped since.
    pub fn is_started(&self) -> bool {
        self.context.lock().is_some()
    }
}

impl Driver for MemoryDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, key: &str, _scheme: &Scheme) -> Result<Vec<u8>> {
        self.values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::fetch(key, format!("no value in driver '{}'", self.name)))
    }

    fn start(&self, ctx: Context) -> Result<()> {
        tracing::debug!(driver = %self.name, units = ctx.schemes().len(), "memory driver started");
        *self.context.lock() = Some(ctx);
        Ok(())
    }

    fn stop(&self) {
        self.context.lock().take();
    }
}
