//! The unit capability and its type-erased registered form.

use crate::core::option::{ErrorHandler, Hook, Scheme, SlotLock, UnitOption};
use crate::core::slot::Slot;
use crate::error::{ConfigError, Result};
use crate::parser::Parser;
use std::fmt;
use std::sync::Arc;

/// A consumer of configuration.
///
/// Implementors own a [`Slot`] that receives decoded configuration and
/// declare their loading policy through [`Unit::option`].
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "json")]
/// # {
/// use unitconf::core::{Slot, Unit, UnitOption};
/// use unitconf::parser::Json;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct DbConfig {
///     host: String,
///     port: u16,
/// }
///
/// #[derive(Default)]
/// struct Database {
///     config: Slot<DbConfig>,
/// }
///
/// impl Unit for Database {
///     type Config = DbConfig;
///
///     fn option(&self) -> UnitOption<DbConfig> {
///         UnitOption::new("dba").with_parser(Json)
///     }
///
///     fn pre_units(&self) -> Vec<String> {
///         vec!["logger".to_string()]
///     }
///
///     fn slot(&self) -> &Slot<DbConfig> {
///         &self.config
///     }
/// }
/// # }
/// ```
pub trait Unit: Send + Sync + 'static {
    /// The configuration type decoded into this unit's slot.
    type Config: Clone + Send + Sync + 'static;

    /// The loading policy. Called once, when the unit is registered.
    fn option(&self) -> UnitOption<Self::Config>;

    /// Keys of units that must be loaded before this one.
    fn pre_units(&self) -> Vec<String> {
        Vec::new()
    }

    /// The slot decoded configuration is written into.
    ///
    /// Must return the same slot on every call.
    fn slot(&self) -> &Slot<Self::Config>;
}

/// Object-safe view of a [`Unit`], so units with different configuration
/// types can be registered together.
///
/// Every `Unit` implements this trait; callers only ever coerce
/// `Arc<MyUnit>` into `Arc<dyn DynUnit>`.
pub trait DynUnit: Send + Sync {
    #[doc(hidden)]
    fn bind(self: Arc<Self>) -> Result<RegisteredUnit>;
}

impl<U: Unit> DynUnit for U {
    fn bind(self: Arc<Self>) -> Result<RegisteredUnit> {
        let option = self.option();
        if option.key.is_empty() {
            return Err(ConfigError::EmptyUnitKey);
        }
        let parser = option
            .parser
            .ok_or_else(|| ConfigError::MissingParser(option.key.clone()))?;
        let pre_units = self.pre_units();
        let unit = self;

        Ok(RegisteredUnit {
            key: option.key,
            driver_name: option.driver_name,
            hot_upgrade: option.hot_upgrade,
            schemes: option.schemes,
            lock: option.lock,
            before: option.before,
            after: option.after,
            on_error: option.on_error,
            pre_units,
            decoder: Box::new(move |buf: &[u8]| decode_into_slot(&*parser, unit.slot(), buf)),
        })
    }
}

/// Decode into a copy of the current value, then publish it.
fn decode_into_slot<T: Clone>(parser: &dyn Parser<T>, slot: &Slot<T>, buf: &[u8]) -> Result<()> {
    let mut next = T::clone(&slot.get());
    parser.decode(&mut next, buf)?;
    slot.store(next);
    Ok(())
}

type Decoder = Box<dyn Fn(&[u8]) -> Result<()> + Send + Sync>;

/// A unit after registration, with its slot type erased.
#[doc(hidden)]
pub struct RegisteredUnit {
    pub(crate) key: String,
    pub(crate) driver_name: Option<String>,
    pub(crate) hot_upgrade: bool,
    pub(crate) schemes: Scheme,
    pub(crate) lock: Option<SlotLock>,
    pub(crate) before: Option<Hook>,
    pub(crate) after: Option<Hook>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) pre_units: Vec<String>,
    decoder: Decoder,
}

impl RegisteredUnit {
    /// Decode `buf` into the slot, holding the unit's lock if one is set.
    pub(crate) fn decode(&self, buf: &[u8]) -> Result<()> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());
        (self.decoder)(buf)
    }

    pub(crate) fn report(&self, err: ConfigError) {
        match &self.on_error {
            Some(handler) => handler(err),
            None => tracing::warn!(unit = %self.key, error = %err, "hot upgrade failed"),
        }
    }
}

impl fmt::Debug for RegisteredUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredUnit")
            .field("key", &self.key)
            .field("driver_name", &self.driver_name)
            .field("hot_upgrade", &self.hot_upgrade)
            .field("pre_units", &self.pre_units)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubling;

    impl Parser<i64> for Doubling {
        fn encode(&self, value: &i64) -> Result<Vec<u8>> {
            Ok(value.to_string().into_bytes())
        }

        fn decode(&self, target: &mut i64, buf: &[u8]) -> Result<()> {
            let text = std::str::from_utf8(buf).map_err(|e| ConfigError::Parse(e.to_string()))?;
            *target = text
                .trim()
                .parse::<i64>()
                .map_err(|e| ConfigError::Parse(e.to_string()))?
                * 2;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counter {
        slot: Slot<i64>,
    }

    impl Unit for Counter {
        type Config = i64;

        fn option(&self) -> UnitOption<i64> {
            UnitOption::new("counter").with_parser(Doubling)
        }

        fn slot(&self) -> &Slot<i64> {
            &self.slot
        }
    }

    struct Keyless;

    impl Unit for Keyless {
        type Config = i64;

        fn option(&self) -> UnitOption<i64> {
            UnitOption::new("").with_parser(Doubling)
        }

        fn slot(&self) -> &Slot<i64> {
            unreachable!("never registered")
        }
    }

    struct Parserless {
        slot: Slot<i64>,
    }

    impl Unit for Parserless {
        type Config = i64;

        fn option(&self) -> UnitOption<i64> {
            UnitOption::new("parserless")
        }

        fn slot(&self) -> &Slot<i64> {
            &self.slot
        }
    }

    #[test]
    fn test_bind_decodes_into_unit_slot() {
        let unit = Arc::new(Counter::default());
        let registered = (Arc::clone(&unit) as Arc<dyn DynUnit>).bind().unwrap();

        assert_eq!(registered.key, "counter");
        assert!(registered.pre_units.is_empty());

        registered.decode(b"21").unwrap();
        assert_eq!(*unit.slot().get(), 42);
        assert_eq!(unit.slot().version(), 1);
    }

    #[test]
    fn test_failed_decode_keeps_previous_value() {
        let unit = Arc::new(Counter::default());
        let registered = (Arc::clone(&unit) as Arc<dyn DynUnit>).bind().unwrap();

        registered.decode(b"5").unwrap();
        assert!(registered.decode(b"five").is_err());
        assert_eq!(*unit.slot().get(), 10);
        assert_eq!(unit.slot().version(), 1);
    }

    #[test]
    fn test_bind_rejects_empty_key() {
        let err = (Arc::new(Keyless) as Arc<dyn DynUnit>).bind().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyUnitKey));
    }

    #[test]
    fn test_bind_rejects_missing_parser() {
        let unit = Arc::new(Parserless {
            slot: Slot::new(0),
        });
        let err = (unit as Arc<dyn DynUnit>).bind().unwrap_err();
        assert!(matches!(err, ConfigError::MissingParser(key) if key == "parserless"));
    }

    #[test]
    fn test_debug_omits_callbacks() {
        let unit = Arc::new(Counter::default());
        let registered = (unit as Arc<dyn DynUnit>).bind().unwrap();
        let debug = format!("{:?}", registered);
        assert!(debug.contains("key: \"counter\""));
        assert!(debug.contains("hot_upgrade: false"));
    }
}
