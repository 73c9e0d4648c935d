//! The stable target a unit's configuration is decoded into.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, lock-free holder for a unit's current configuration.
///
/// A slot is created once per unit and never replaced. Every successful load
/// or hot upgrade stores a new value into the same slot, so anyone holding a
/// reference to the unit observes the update on the next [`Slot::get`].
///
/// # Examples
///
/// ```rust
/// use unitconf::core::Slot;
///
/// let slot = Slot::new(42);
/// assert_eq!(*slot.get(), 42);
///
/// slot.store(7);
/// assert_eq!(*slot.get(), 7);
/// assert_eq!(slot.version(), 1);
/// ```
pub struct Slot<T> {
    current: ArcSwap<T>,
    version: AtomicU64,
}

impl<T> Slot<T> {
    /// Create a slot holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(initial)),
            version: AtomicU64::new(0),
        }
    }

    /// Get a reference-counted snapshot of the current value.
    ///
    /// Readers never block writers or other readers.
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Atomically replace the current value.
    pub fn store(&self, value: T) {
        self.current.store(Arc::new(value));
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of values stored since the slot was created.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("current", &self.get())
            .field("version", &self.version())
            .finish()
    }
}
