//! Integration tests for the directory driver with real files.

#![cfg(all(feature = "dir", feature = "json"))]

mod common;

use common::{TestUnit, dyns};
use std::fs;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use unitconf::drivers::DirDriver;
use unitconf::prelude::*;

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    condition()
}

#[test]
fn test_initial_load_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("logger.json"), r#"{"x":1}"#).unwrap();
    fs::write(temp_dir.path().join("dba.json"), r#"{"y":2}"#).unwrap();

    let logger = TestUnit::new("logger").build();
    let dba = TestUnit::new("dba").after_units(&["logger"]).build();

    let configure = Configure::builder(DirDriver::new(temp_dir.path()))
        .build()
        .unwrap();
    configure.listen(dyns(&[&dba, &logger])).unwrap();

    assert_eq!(logger.slot.get().x, 1);
    assert_eq!(dba.slot.get().y, 2);
    assert_eq!(configure.load_order(), vec!["logger", "dba"]);
}

#[test]
fn test_missing_file_fails_listen() {
    let temp_dir = TempDir::new().unwrap();
    let logger = TestUnit::new("logger").build();

    let configure = Configure::builder(DirDriver::new(temp_dir.path()))
        .build()
        .unwrap();
    let err = configure.listen(dyns(&[&logger])).unwrap_err();
    assert!(matches!(err, ConfigError::Fetch { ref key, .. } if key == "logger"));
}

#[test]
fn test_file_change_triggers_hot_upgrade() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("logger.json");
    fs::write(&path, r#"{"x":1}"#).unwrap();
    fs::write(temp_dir.path().join("other.json"), r#"{"x":1}"#).unwrap();

    let logger = TestUnit::new("logger").hot().build();
    let configure = Configure::builder(DirDriver::new(temp_dir.path()))
        .build()
        .unwrap();
    configure.listen(dyns(&[&logger])).unwrap();
    assert_eq!(logger.slot.get().x, 1);

    // Give the watcher time to initialize
    thread::sleep(Duration::from_millis(100));
    fs::write(temp_dir.path().join("other.json"), r#"{"x":3}"#).unwrap();
    fs::write(&path, r#"{"x":2}"#).unwrap();

    assert!(wait_for(|| logger.slot.get().x == 2));
    configure.close();
}

#[test]
fn test_cold_units_are_not_watched() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("logger.json");
    fs::write(&path, r#"{"x":1}"#).unwrap();

    let driver = std::sync::Arc::new(DirDriver::new(temp_dir.path()));
    let logger = TestUnit::new("logger").build();
    let configure = Configure::builder(std::sync::Arc::clone(&driver))
        .build()
        .unwrap();
    configure.listen(dyns(&[&logger])).unwrap();

    assert!(!driver.is_watching());
}

#[test]
fn test_watch_fails_for_vanished_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("conf");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("logger.json"), r#"{"x":1}"#).unwrap();

    // Fetch happens before the watcher starts, so remove the root in between
    // by using a unit whose post-load hook deletes it.
    let doomed = root.clone();
    let logger = TestUnit::new("logger")
        .hot()
        .after_hook(
            std::sync::Arc::new(move || -> Result<()> {
                fs::remove_dir_all(&doomed)?;
                Ok(())
            }),
            true,
        )
        .build();

    let configure = Configure::builder(DirDriver::new(&root)).build().unwrap();
    let err = configure.listen(dyns(&[&logger])).unwrap_err();
    assert!(matches!(err, ConfigError::DriverStart { ref driver, .. } if driver == "dir"));
}
