//! Core orchestration types.

mod builder;
mod configure;
mod context;
mod option;
mod slot;
mod topology;
mod unit;

pub use builder::ConfigureBuilder;
pub use configure::Configure;
pub use context::Context;
pub use option::{Hook, Scheme, SlotLock, UnitOption};
pub use slot::Slot;
pub use unit::{DynUnit, Unit};

#[doc(hidden)]
pub use unit::RegisteredUnit;
