//! Directory-based driver with file watching.

use super::Driver;
use super::driver::suffix;
use crate::core::{Context, Scheme};
use crate::error::{ConfigError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// Driver that reads each unit from a file in one directory.
///
/// The file for unit `key` is `<root>/<key><suffix>`, where `suffix` is the
/// unit's `"suffix"` scheme entry (empty when unset). When started, the
/// directory is watched and every created or modified unit file is pushed
/// as a hot upgrade.
///
/// # Examples
///
/// ```rust,no_run
/// use unitconf::drivers::DirDriver;
///
/// // conf/logger.json, conf/dba.json, ...
/// let driver = DirDriver::new("./conf");
/// ```
pub struct DirDriver {
    name: String,
    root: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl DirDriver {
    /// Create a driver reading from `root`, named `"dir"`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            name: "dir".to_string(),
            root: root.into(),
            watcher: Mutex::new(None),
        }
    }

    /// Override the driver name, e.g. to use two directories at once.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The watched directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a watcher is currently running.
    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }

    fn file_for(&self, key: &str, scheme: &Scheme) -> PathBuf {
        self.root.join(format!("{}{}", key, suffix(scheme)))
    }
}

/// Map a changed file name back to the unit it belongs to.
fn unit_for_file<'a>(ctx: &'a Context, file_name: &str) -> Option<&'a str> {
    ctx.schemes()
        .iter()
        .find(|(key, scheme)| format!("{}{}", key, suffix(scheme)) == file_name)
        .map(|(key, _)| key.as_str())
}

fn handle_event(ctx: &Context, event: Event) {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return;
    }
    for path in event.paths {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(key) = unit_for_file(ctx, file_name) else {
            continue;
        };
        match fs::read(&path) {
            Ok(buf) => {
                tracing::info!(unit = %key, path = %path.display(), "unit file changed");
                ctx.push_update(key, buf);
            }
            Err(e) => {
                tracing::error!(unit = %key, path = %path.display(), error = %e, "failed to read changed unit file");
            }
        }
    }
}

impl Driver for DirDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, key: &str, scheme: &Scheme) -> Result<Vec<u8>> {
        let path = self.file_for(key, scheme);
        fs::read(&path).map_err(|e| ConfigError::fetch(key, format!("{}: {}", path.display(), e)))
    }

    fn start(&self, ctx: Context) -> Result<()> {
        let root = self.root.canonicalize().map_err(|e| {
            ConfigError::Watch(format!("Failed to resolve {}: {}", self.root.display(), e))
        })?;

        let driver = self.name.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => handle_event(&ctx, event),
            Err(e) => tracing::error!(driver = %driver, error = %e, "watch error"),
        })
        .map_err(|e| ConfigError::Watch(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Watch(format!("Failed to watch {}: {}", root.display(), e)))?;

        tracing::info!(driver = %self.name, path = %root.display(), "directory watcher started");
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }

    fn stop(&self) {
        if self.watcher.lock().take().is_some() {
            tracing::debug!(driver = %self.name, "directory watcher stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scheme_with_suffix(value: &str) -> Scheme {
        let mut scheme = Scheme::new();
        scheme.insert(super::super::SUFFIX.to_string(), value.into());
        scheme
    }

    #[test]
    fn test_fetch_with_suffix() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("logger.json"), r#"{"file":"app.log"}"#).unwrap();

        let driver = DirDriver::new(temp_dir.path());
        let buf = driver.fetch("logger", &scheme_with_suffix(".json")).unwrap();
        assert_eq!(buf, br#"{"file":"app.log"}"#);
    }

    #[test]
    fn test_fetch_without_suffix() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("logger"), "raw").unwrap();

        let driver = DirDriver::new(temp_dir.path());
        assert_eq!(driver.fetch("logger", &Scheme::new()).unwrap(), b"raw");
    }

    #[test]
    fn test_fetch_missing_file() {
        let driver = DirDriver::new("/nonexistent/conf");
        let err = driver.fetch("logger", &Scheme::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Fetch { .. }));
    }

    #[test]
    fn test_name() {
        assert_eq!(DirDriver::new("conf").name(), "dir");
        assert_eq!(DirDriver::new("conf").with_name("secrets").name(), "secrets");
    }

    #[test]
    fn test_non_string_suffix_is_ignored() {
        let mut scheme = Scheme::new();
        scheme.insert(super::super::SUFFIX.to_string(), vec![1i64, 2].into());
        let driver = DirDriver::new("conf");
        assert_eq!(driver.file_for("logger", &scheme), Path::new("conf").join("logger"));
    }

    #[test]
    fn test_stop_before_start() {
        let driver = DirDriver::new("conf");
        driver.stop();
        assert!(!driver.is_watching());
    }
}
