//! Driver trait.

use crate::core::{Context, Scheme};
use crate::error::Result;
use std::sync::Arc;

/// A named source of raw configuration bytes.
///
/// Implement this trait to load units from somewhere new (a directory, a
/// remote config service, a database). Drivers that can detect changes push
/// them back through the [`Context`] they receive in [`Driver::start`].
pub trait Driver: Send + Sync {
    /// Stable, non-empty name units use to bind to this driver.
    fn name(&self) -> &str;

    /// Fetch the bytes for unit `key`.
    ///
    /// `scheme` carries the unit's hints, e.g. a file suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be produced.
    fn fetch(&self, key: &str, scheme: &Scheme) -> Result<Vec<u8>>;

    /// Start pushing updates for the units listed in `ctx`.
    ///
    /// Must return promptly; any watching happens in the background. Only
    /// called when at least one bound unit accepts hot upgrades.
    fn start(&self, ctx: Context) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Stop pushing updates.
    ///
    /// May be called several times, and before `start`.
    fn stop(&self) {}
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, key: &str, scheme: &Scheme) -> Result<Vec<u8>> {
        (**self).fetch(key, scheme)
    }

    fn start(&self, ctx: Context) -> Result<()> {
        (**self).start(ctx)
    }

    fn stop(&self) {
        (**self).stop()
    }
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, key: &str, scheme: &Scheme) -> Result<Vec<u8>> {
        (**self).fetch(key, scheme)
    }

    fn start(&self, ctx: Context) -> Result<()> {
        (**self).start(ctx)
    }

    fn stop(&self) {
        (**self).stop()
    }
}

/// Read the `suffix` scheme entry, empty when absent or not a string.
#[cfg(any(feature = "dir", feature = "remote"))]
pub(crate) fn suffix(scheme: &Scheme) -> String {
    scheme
        .get(super::SUFFIX)
        .and_then(|value| value.clone().into_string().ok())
        .unwrap_or_default()
}
