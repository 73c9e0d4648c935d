//! Shared fixtures for integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use unitconf::core::SlotLock;
use unitconf::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

pub type HookFn = Arc<dyn Fn() -> Result<()> + Send + Sync>;
pub type ErrorFn = Arc<dyn Fn(ConfigError) + Send + Sync>;

/// A unit decoding `Settings`, configurable field by field.
pub struct TestUnit {
    pub key: String,
    pub driver: String,
    pub pre: Vec<String>,
    pub hot: bool,
    pub parser: Option<Arc<dyn Parser<Settings>>>,
    pub before: Option<(HookFn, bool)>,
    pub after: Option<(HookFn, bool)>,
    pub on_error: Option<ErrorFn>,
    pub lock: Option<SlotLock>,
    pub slot: Slot<Settings>,
}

impl TestUnit {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            driver: String::new(),
            pre: Vec::new(),
            hot: false,
            parser: Some(Arc::new(Json) as Arc<dyn Parser<Settings>>),
            before: None,
            after: None,
            on_error: None,
            lock: None,
            slot: Slot::default(),
        }
    }

    pub fn driver(mut self, name: &str) -> Self {
        self.driver = name.to_string();
        self
    }

    pub fn after_units(mut self, keys: &[&str]) -> Self {
        self.pre = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn hot(mut self) -> Self {
        self.hot = true;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn Parser<Settings>>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn without_parser(mut self) -> Self {
        self.parser = None;
        self
    }

    pub fn before_hook(mut self, hook: HookFn, run_on_load: bool) -> Self {
        self.before = Some((hook, run_on_load));
        self
    }

    pub fn after_hook(mut self, hook: HookFn, run_on_load: bool) -> Self {
        self.after = Some((hook, run_on_load));
        self
    }

    pub fn on_error(mut self, handler: ErrorFn) -> Self {
        self.on_error = Some(handler);
        self
    }

    pub fn lock(mut self, lock: SlotLock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Unit for TestUnit {
    type Config = Settings;

    fn option(&self) -> UnitOption<Settings> {
        let mut option = UnitOption::new(self.key.clone())
            .with_driver(self.driver.clone())
            .hot_upgrade(self.hot)
            .with_scheme("suffix", ".json");
        if let Some(parser) = &self.parser {
            option = option.with_parser(Arc::clone(parser));
        }
        if let Some((hook, run_on_load)) = &self.before {
            let hook = Arc::clone(hook);
            option = option.before(move || hook(), *run_on_load);
        }
        if let Some((hook, run_on_load)) = &self.after {
            let hook = Arc::clone(hook);
            option = option.after(move || hook(), *run_on_load);
        }
        if let Some(handler) = &self.on_error {
            let handler = Arc::clone(handler);
            option = option.on_error(move |err| handler(err));
        }
        if let Some(lock) = &self.lock {
            option = option.with_lock(Arc::clone(lock));
        }
        option
    }

    fn pre_units(&self) -> Vec<String> {
        self.pre.clone()
    }

    fn slot(&self) -> &Slot<Settings> {
        &self.slot
    }
}

pub fn dyns(units: &[&Arc<TestUnit>]) -> Vec<Arc<dyn DynUnit>> {
    units
        .iter()
        .map(|unit| Arc::clone(*unit) as Arc<dyn DynUnit>)
        .collect()
}

/// Ordered record of hook invocations.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn hook(&self, label: &str) -> HookFn {
        let entries = Arc::clone(&self.0);
        let label = label.to_string();
        Arc::new(move || -> Result<()> {
            entries.lock().push(label.clone());
            Ok(())
        })
    }

    pub fn errors(&self) -> ErrorFn {
        let entries = Arc::clone(&self.0);
        Arc::new(move |err: ConfigError| entries.lock().push(format!("error: {}", err)))
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

pub fn failing_hook(reason: &str) -> HookFn {
    let reason = reason.to_string();
    Arc::new(move || -> Result<()> { Err(ConfigError::hook(reason.clone())) })
}
