//! Driver trait and built-in driver implementations.

#[cfg(feature = "dir")]
mod dir;
mod driver;
mod env;
mod memory;
#[cfg(feature = "remote")]
mod remote;

#[cfg(feature = "dir")]
pub use dir::DirDriver;
pub use driver::Driver;
pub use env::EnvDriver;
pub use memory::MemoryDriver;
#[cfg(feature = "remote")]
pub use remote::{HttpAuth, HttpDriver, HttpDriverBuilder};

/// Scheme entry appended to a unit key to form a file or resource name.
pub const SUFFIX: &str = "suffix";
