//! Example demonstrating dependency-ordered loading across drivers.
//!
//! Three units are registered in the wrong order on purpose:
//! - `logger` has no prerequisites
//! - `dba` needs `logger`, and reads its secret from a second driver
//! - `api` needs both
//!
//! Run with: cargo run --example dependent_units

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use unitconf::drivers::MemoryDriver;
use unitconf::prelude::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggerConfig {
    level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DbaConfig {
    url: String,
    password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ApiConfig {
    port: u16,
}

/// A unit with a fixed key, prerequisites, and driver.
struct Component<T> {
    key: &'static str,
    driver: &'static str,
    pre: &'static [&'static str],
    config: Slot<T>,
}

impl<T: Default> Component<T> {
    fn new(key: &'static str, driver: &'static str, pre: &'static [&'static str]) -> Arc<Self> {
        Arc::new(Self {
            key,
            driver,
            pre,
            config: Slot::default(),
        })
    }
}

impl<T> Unit for Component<T>
where
    T: Clone + Send + Sync + Serialize + serde::de::DeserializeOwned + 'static,
{
    type Config = T;

    fn option(&self) -> UnitOption<T> {
        let key = self.key;
        UnitOption::new(key)
            .with_parser(Json)
            .with_driver(self.driver)
            .after(
                move || {
                    println!("  loaded {}", key);
                    Ok(())
                },
                true,
            )
    }

    fn pre_units(&self) -> Vec<String> {
        self.pre.iter().map(|k| k.to_string()).collect()
    }

    fn slot(&self) -> &Slot<T> {
        &self.config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let files = MemoryDriver::new("files");
    files.insert("logger", r#"{"level": "debug"}"#);
    files.insert("api", r#"{"port": 8443}"#);

    let secrets = MemoryDriver::new("secrets");
    secrets.insert("dba", r#"{"url": "postgres://db/app", "password": "hunter2"}"#);

    let logger = Component::<LoggerConfig>::new("logger", "", &[]);
    let dba = Component::<DbaConfig>::new("dba", "secrets", &["logger"]);
    let api = Component::<ApiConfig>::new("api", "", &["logger", "dba"]);

    let configure = Configure::builder(files).with_driver(secrets).build()?;

    println!("Loading:");
    configure.listen(vec![
        api.clone() as Arc<dyn DynUnit>,
        dba.clone() as Arc<dyn DynUnit>,
        logger.clone() as Arc<dyn DynUnit>,
    ])?;

    println!("\nLoad order: {:?}", configure.load_order());
    println!("logger: {:?}", logger.config.get());
    println!("dba:    {}", dba.config.get().url);
    println!("api:    port {}", api.config.get().port);

    configure.close();
    Ok(())
}
