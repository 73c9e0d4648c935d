//! Environment variable driver.

use super::Driver;
use crate::core::Scheme;
use crate::error::{ConfigError, Result};

/// Driver that reads each unit from one environment variable.
///
/// Unit `key` maps to `<PREFIX><SEPARATOR><KEY>`, with the key uppercased and
/// `-` or `.` replaced by `_`. The variable holds the whole encoded document,
/// so any parser can decode it. Environment variables cannot be watched, so
/// this driver never pushes.
///
/// # Examples
///
/// ```rust
/// use unitconf::drivers::EnvDriver;
///
/// // APP_LOGGER='{"file": "app.log"}' -> unit "logger"
/// let driver = EnvDriver::new("APP", "_");
/// assert_eq!(driver.variable_for("logger"), "APP_LOGGER");
/// ```
pub struct EnvDriver {
    name: String,
    prefix: String,
    separator: String,
}

impl EnvDriver {
    /// Create a new environment variable driver, named `"env"`.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Placed between the prefix and the key (e.g., "_")
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            name: "env".to_string(),
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    /// Override the driver name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The variable name unit `key` is read from.
    pub fn variable_for(&self, key: &str) -> String {
        let key: String = key
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        if self.prefix.is_empty() {
            key
        } else {
            format!("{}{}{}", self.prefix, self.separator, key)
        }
    }
}

impl Driver for EnvDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, key: &str, _scheme: &Scheme) -> Result<Vec<u8>> {
        let variable = self.variable_for(key);
        std::env::var_os(&variable)
            .map(|value| value.into_encoded_bytes())
            .ok_or_else(|| ConfigError::fetch(key, format!("environment variable {} is not set", variable)))
    }
}
