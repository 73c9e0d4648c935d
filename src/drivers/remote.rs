//! Remote HTTP/HTTPS driver with polling.

use super::Driver;
use super::driver::suffix;
use crate::core::{Context, Scheme};
use crate::error::{ConfigError, Result};
use parking_lot::Mutex;
use reqwest::{Client, header::HeaderValue};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Authentication method for HTTP requests.
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

/// Driver that fetches each unit from a remote HTTP endpoint.
///
/// Unit `key` is fetched from `<base_url>/<key><suffix>`. When started, a
/// background task polls every watched unit and pushes a hot upgrade
/// whenever the body differs from the last one it saw.
///
/// Requests run on a runtime owned by the driver. `fetch` blocks the calling
/// thread until its request finishes, so it may be called from plain threads
/// and from inside another tokio runtime alike.
///
/// # Examples
///
/// ```rust,no_run
/// use unitconf::drivers::HttpDriver;
/// use std::time::Duration;
///
/// # fn example() -> unitconf::error::Result<()> {
/// let driver = HttpDriver::builder()
///     .with_base_url("https://config.example.com/units")
///     .with_auth_token("secret-token")
///     .with_poll_interval(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HttpDriver {
    name: String,
    base_url: String,
    client: Client,
    auth: HttpAuth,
    poll_interval: Duration,
    handle: Handle,
    /// Taken on drop and shut down without blocking.
    runtime: Option<Runtime>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl HttpDriver {
    /// Create a new builder for constructing an HTTP driver.
    pub fn builder() -> HttpDriverBuilder {
        HttpDriverBuilder::new()
    }

    /// The URL unit `key` is fetched from.
    pub fn url_for(&self, key: &str, scheme: &Scheme) -> String {
        format!("{}/{}{}", self.base_url.trim_end_matches('/'), key, suffix(scheme))
    }

    /// Whether the polling task is running.
    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }
}

async fn request(client: &Client, auth: &HttpAuth, key: &str, url: &str) -> Result<Vec<u8>> {
    let mut request = client.get(url);

    request = match auth {
        HttpAuth::None => request,
        HttpAuth::Bearer(token) => {
            let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ConfigError::fetch(key, format!("Invalid bearer token: {}", e)))?;
            request.header("Authorization", header_value)
        }
        HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
    };

    let response = request
        .send()
        .await
        .map_err(|e| ConfigError::fetch(key, format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConfigError::fetch(
            key,
            format!(
                "HTTP request failed with status {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            ),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ConfigError::fetch(key, format!("Failed to read body: {}", e)))?;
    Ok(body.to_vec())
}

impl Driver for HttpDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, key: &str, scheme: &Scheme) -> Result<Vec<u8>> {
        let url = self.url_for(key, scheme);
        let client = self.client.clone();
        let auth = self.auth.clone();
        let owned_key = key.to_string();
        let (tx, rx) = mpsc::sync_channel(1);

        self.handle.spawn(async move {
            let _ = tx.send(request(&client, &auth, &owned_key, &url).await);
        });
        rx.recv().map_err(|_| {
            ConfigError::fetch(key, "HTTP runtime shut down before the request finished")
        })?
    }

    fn start(&self, ctx: Context) -> Result<()> {
        let targets: Vec<(String, String)> = ctx
            .schemes()
            .iter()
            .map(|(key, scheme)| (key.clone(), self.url_for(key, scheme)))
            .collect();
        let client = self.client.clone();
        let auth = self.auth.clone();
        let interval = self.poll_interval;
        let driver = self.name.clone();

        let handle = self.handle.spawn(async move {
            // The first sighting of each unit only records a baseline; the
            // initial load already applied it.
            let mut last_seen: HashMap<String, Vec<u8>> = HashMap::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                for (key, url) in &targets {
                    match request(&client, &auth, key, url).await {
                        Ok(buf) => match last_seen.get(key) {
                            Some(previous) if *previous == buf => {}
                            Some(_) => {
                                tracing::info!(driver = %driver, unit = %key, "remote unit changed");
                                ctx.push_update(key, &buf);
                                last_seen.insert(key.clone(), buf);
                            }
                            None => {
                                last_seen.insert(key.clone(), buf);
                            }
                        },
                        Err(e) => {
                            tracing::error!(driver = %driver, unit = %key, error = %e, "poll failed");
                        }
                    }
                }
            }
        });

        if let Some(previous) = self.poller.lock().replace(handle) {
            previous.abort();
        }
        tracing::info!(driver = %self.name, every = ?self.poll_interval, "remote polling started");
        Ok(())
    }

    fn stop(&self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
            tracing::debug!(driver = %self.name, "remote polling stopped");
        }
    }
}

impl Drop for HttpDriver {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Builder for constructing an [`HttpDriver`].
pub struct HttpDriverBuilder {
    name: String,
    base_url: Option<String>,
    auth: HttpAuth,
    timeout: Duration,
    poll_interval: Duration,
}

impl HttpDriverBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            name: "http".to_string(),
            base_url: None,
            auth: HttpAuth::None,
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
        }
    }

    /// Set the URL units are fetched under.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the driver name. Default is `"http"`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the request timeout. Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how often watched units are polled. Default is 30 seconds.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the HTTP driver.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No base URL is provided
    /// - The poll interval is zero
    /// - The HTTP client or runtime cannot be constructed
    pub fn build(self) -> Result<HttpDriver> {
        let base_url = self
            .base_url
            .ok_or_else(|| ConfigError::Other("A base URL is required for HttpDriver".to_string()))?;
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Other("Poll interval must be greater than zero".to_string()));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::Other(format!("Failed to create HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("unitconf-http")
            .enable_all()
            .build()?;

        Ok(HttpDriver {
            name: self.name,
            base_url,
            client,
            auth: self.auth,
            poll_interval: self.poll_interval,
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            poller: Mutex::new(None),
        })
    }
}

impl Default for HttpDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
