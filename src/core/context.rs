//! The handle a driver uses to read scheme snapshots and push updates.

use crate::core::configure::Shared;
use crate::core::option::Scheme;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Per-driver handle passed to [`Driver::start`](crate::drivers::Driver::start).
///
/// It exposes a copy of the scheme of every hot-upgrade unit bound to the
/// driver, and a single entry point for pushing new bytes. The handle is
/// cheap to clone and safe to use from any thread; pushes that arrive after
/// the orchestrator is gone are ignored.
#[derive(Clone)]
pub struct Context {
    driver: String,
    schemes: Arc<HashMap<String, Scheme>>,
    shared: Weak<Shared>,
}

impl Context {
    pub(crate) fn new(
        driver: String,
        schemes: HashMap<String, Scheme>,
        shared: Weak<Shared>,
    ) -> Self {
        Self {
            driver,
            schemes: Arc::new(schemes),
            shared,
        }
    }

    /// Name of the driver this context was built for.
    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    /// Scheme of every watched unit, keyed by unit key.
    pub fn schemes(&self) -> &HashMap<String, Scheme> {
        &self.schemes
    }

    /// Scheme of one watched unit.
    pub fn scheme(&self, key: &str) -> Option<&Scheme> {
        self.schemes.get(key)
    }

    /// Keys of the units this driver should watch.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    /// Push new bytes for the unit `key`.
    ///
    /// Runs the unit's hooks and decode on the calling thread. Pushes for
    /// unknown units are dropped; failures are reported to the unit's error
    /// handler and never returned to the driver.
    pub fn push_update(&self, key: &str, buf: impl AsRef<[u8]>) {
        match self.shared.upgrade() {
            Some(shared) => shared.push(&self.driver, key, buf.as_ref()),
            None => {
                tracing::debug!(driver = %self.driver, unit = %key, "orchestrator dropped, ignoring push")
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("driver", &self.driver)
            .field("schemes", &self.schemes)
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(schemes: HashMap<String, Scheme>) -> Context {
        Context::new("memory".to_string(), schemes, Weak::new())
    }

    #[test]
    fn test_scheme_lookup() {
        let mut scheme = Scheme::new();
        scheme.insert("suffix".to_string(), ".json".into());
        let mut schemes = HashMap::new();
        schemes.insert("logger".to_string(), scheme);

        let ctx = detached(schemes);
        assert_eq!(ctx.driver_name(), "memory");
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["logger"]);
        assert!(ctx.scheme("dba").is_none());
        let suffix = ctx.scheme("logger").unwrap()["suffix"].clone();
        assert_eq!(suffix.into_string().unwrap(), ".json");
    }

    #[test]
    fn test_push_without_orchestrator_is_ignored() {
        let ctx = detached(HashMap::new());
        ctx.push_update("logger", b"{}");
        assert!(!format!("{:?}", ctx).contains("attached: true"));
    }
}
