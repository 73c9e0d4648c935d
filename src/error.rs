//! Error types for unitconf.

/// Result type alias for unitconf operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while registering, ordering, or loading units.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A driver was registered with an empty name.
    #[error("Driver name is empty")]
    EmptyDriverName,

    /// Two drivers share the same name.
    #[error("Driver '{0}' already exists")]
    DriverExists(String),

    /// A unit is bound to a driver name that was never registered.
    #[error("Driver '{0}' not found")]
    DriverNotFound(String),

    /// A unit option carries an empty key.
    #[error("Unit key is empty")]
    EmptyUnitKey,

    /// A unit option has no parser attached.
    #[error("Unit '{0}' has no parser")]
    MissingParser(String),

    /// Two units share the same key.
    #[error("Unit '{0}' already exists")]
    UnitExists(String),

    /// A prerequisite key names a unit that was never registered.
    #[error("Unit '{0}' not found")]
    UnitNotFound(String),

    /// The remaining units depend on each other in a cycle.
    #[error("Unit loop detected among: {}", .0.join(", "))]
    UnitLoop(Vec<String>),

    /// A driver failed to produce bytes for a unit.
    #[error("Failed to fetch unit '{key}': {reason}")]
    Fetch {
        /// The unit key being fetched
        key: String,
        /// Why the fetch failed
        reason: String,
    },

    /// Failed to decode bytes into a unit's slot.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Failed to encode a value into bytes.
    #[error("Failed to encode configuration: {0}")]
    Encode(String),

    /// A pre or post hook reported a failure.
    #[error("Hook failed: {0}")]
    Hook(String),

    /// A driver's start routine failed; already started drivers were stopped.
    #[error("Failed to start driver '{driver}': {source}")]
    DriverStart {
        /// Name of the driver that failed to start
        driver: String,
        /// The error reported by the driver
        #[source]
        source: Box<ConfigError>,
    },

    /// Watching a source for changes failed.
    #[error("Watch error: {0}")]
    Watch(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Create a fetch error for `key`.
    pub fn fetch(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a hook error with a message.
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Whether this error was raised while validating drivers or units.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::EmptyDriverName
                | Self::DriverExists(_)
                | Self::DriverNotFound(_)
                | Self::EmptyUnitKey
                | Self::MissingParser(_)
                | Self::UnitExists(_)
        )
    }

    /// Whether this error was raised while resolving prerequisites.
    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::UnitNotFound(_) | Self::UnitLoop(_))
    }
}
