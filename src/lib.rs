//! # unitconf
//!
//! Dependency-ordered configuration loading with hot upgrades.
//!
//! ## Overview
//!
//! A process is split into *units* (a logger, a database pool, an HTTP
//! server) that each own a piece of configuration. Each unit names the
//! *driver* its bytes come from, the parser that decodes them, and the units
//! that must be loaded before it. [`Configure`](core::Configure) then:
//!
//! - Validates and registers every unit exactly once
//! - Orders units so prerequisites load first, rejecting cycles
//! - Fetches, hooks, and decodes each unit into its [`Slot`](core::Slot)
//! - Starts drivers that can push changes, and routes each push back to the
//!   owning unit under its lock
//!
//! Reads from a slot are lock-free snapshots built on `arc-swap`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "dir", feature = "json"))]
//! # {
//! use std::sync::Arc;
//! use unitconf::prelude::*;
//! use unitconf::drivers::DirDriver;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct DbaConfig {
//!     url: String,
//! }
//!
//! #[derive(Default)]
//! struct Dba {
//!     config: Slot<DbaConfig>,
//! }
//!
//! impl Unit for Dba {
//!     type Config = DbaConfig;
//!
//!     fn option(&self) -> UnitOption<DbaConfig> {
//!         UnitOption::new("dba")
//!             .with_parser(Json)
//!             .hot_upgrade(true)
//!             .with_scheme("suffix", ".json")
//!     }
//!
//!     fn pre_units(&self) -> Vec<String> {
//!         vec!["logger".to_string()]
//!     }
//!
//!     fn slot(&self) -> &Slot<DbaConfig> {
//!         &self.config
//!     }
//! }
//!
//! # fn example(logger: Arc<dyn DynUnit>) -> Result<()> {
//! let dba = Arc::new(Dba::default());
//! let configure = Configure::builder(DirDriver::new("./conf")).build()?;
//! configure.listen(vec![logger, dba.clone() as Arc<dyn DynUnit>])?;
//!
//! // conf/dba.json is now loaded, and edits to it are applied live.
//! println!("database: {}", dba.config.get().url);
//! # Ok(())
//! # }
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `dir` (default): [`DirDriver`](drivers::DirDriver), watching a directory with `notify`
//! - `json` (default), `yaml`, `toml`, `xml`: built-in [`Parser`](parser::Parser)s
//! - `remote`: [`HttpDriver`](drivers::HttpDriver), polling an HTTP endpoint
//! - `metrics`: OpenTelemetry counters for loads and pushes

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod drivers;
pub mod error;
pub mod parser;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        Configure, ConfigureBuilder, Context, DynUnit, Scheme, Slot, Unit, UnitOption,
    };
    pub use crate::drivers::Driver;
    pub use crate::error::{ConfigError, Result};
    pub use crate::parser::Parser;

    #[cfg(feature = "json")]
    pub use crate::parser::Json;
    #[cfg(feature = "toml")]
    pub use crate::parser::Toml;
    #[cfg(feature = "xml")]
    pub use crate::parser::Xml;
    #[cfg(feature = "yaml")]
    pub use crate::parser::Yaml;
}
