//! Example demonstrating directory watching and hot upgrades.
//!
//! This example shows how to:
//! - Load a unit from `<dir>/<key><suffix>` with the directory driver
//! - Opt the unit in to hot upgrades
//! - Run hooks around every upgrade and handle failed upgrades
//!
//! Run with: cargo run --example dir_hot_upgrade
//!
//! While running, edit the printed `server.json` path to see live upgrades.
//! Set `RUST_LOG=unitconf=debug` for the library's own logs.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use unitconf::drivers::DirDriver;
use unitconf::prelude::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServerConfig {
    host: String,
    port: u16,
}

#[derive(Default)]
struct Server {
    config: Slot<ServerConfig>,
}

impl Unit for Server {
    type Config = ServerConfig;

    fn option(&self) -> UnitOption<ServerConfig> {
        UnitOption::new("server")
            .with_parser(Json)
            .hot_upgrade(true)
            .with_scheme("suffix", ".json")
            .before(
                || {
                    tracing::info!("draining connections before upgrade");
                    Ok(())
                },
                false,
            )
            .after(
                || {
                    tracing::info!("listener rebound");
                    Ok(())
                },
                false,
            )
            .on_error(|err| tracing::error!(error = %err, "upgrade rejected, keeping old config"))
    }

    fn slot(&self) -> &Slot<ServerConfig> {
        &self.config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dir = std::env::temp_dir().join("unitconf-demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("server.json");
    std::fs::write(&path, r#"{"host": "localhost", "port": 8080}"#)?;
    println!("Watching {}\n", path.display());

    let server = Arc::new(Server::default());
    let configure = Configure::builder(DirDriver::new(&dir)).build()?;
    configure.listen(vec![server.clone() as Arc<dyn DynUnit>])?;

    println!("Initial: {:?}", server.config.get());

    // Simulate an operator edit, then a broken one.
    std::thread::sleep(Duration::from_secs(2));
    std::fs::write(&path, r#"{"host": "0.0.0.0", "port": 9090}"#)?;
    std::thread::sleep(Duration::from_secs(1));
    std::fs::write(&path, r#"{"host": "#)?;

    for _ in 0..10 {
        std::thread::sleep(Duration::from_secs(1));
        let cfg = server.config.get();
        println!(
            "Current: {}:{} (version {})",
            cfg.host,
            cfg.port,
            server.config.version()
        );
    }

    configure.close();
    println!("\nDone");
    Ok(())
}
