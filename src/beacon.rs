//! Fire-and-forget tracking requests.
//!
//! A beacon is sent once and forgotten: nothing is retried, queued or awaited,
//! and failures only reach the log.

use crate::error::AdError;
use log::{debug, warn};
use rand::Rng;
use std::time::Duration;

/// Sends one-way tracking requests
pub trait BeaconDispatcher: Send + Sync {
    /// Issue a request to `url` for its side effect only. Must never block or fail.
    fn send(&self, url: &str);
}

/// Settings for [`HttpBeaconDispatcher`]
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Replace `[CACHEBUSTING]` with a random number before sending
    pub cache_busting: bool,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            cache_busting: true,
        }
    }
}

/// Sends beacons as HTTP GET requests on a tokio runtime
pub struct HttpBeaconDispatcher {
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
    config: BeaconConfig,
}

impl HttpBeaconDispatcher {
    /// Build a dispatcher that spawns its requests on `runtime`
    pub fn new(config: BeaconConfig, runtime: tokio::runtime::Handle) -> Result<Self, AdError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            runtime,
            config,
        })
    }

    /// Build a dispatcher on the runtime of the calling task
    pub fn current(config: BeaconConfig) -> Result<Self, AdError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AdError::Config(format!("No tokio runtime available: {}", e)))?;
        Self::new(config, runtime)
    }
}

impl BeaconDispatcher for HttpBeaconDispatcher {
    fn send(&self, url: &str) {
        let expanded = if self.config.cache_busting {
            expand_cache_busting(url)
        } else {
            url.to_string()
        };

        let url = match url::Url::parse(&expanded) {
            Ok(url) => url,
            Err(e) => {
                warn!("Dropping beacon with invalid URL {}: {}", expanded, e);
                return;
            }
        };

        let client = self.client.clone();
        self.runtime.spawn(async move {
            match client.get(url.clone()).send().await {
                Ok(response) => debug!("Beacon {} answered {}", url, response.status()),
                Err(e) => warn!("Beacon {} failed: {}", url, e),
            }
        });
    }
}

/// Logs beacons instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl BeaconDispatcher for LogDispatcher {
    fn send(&self, url: &str) {
        log::info!("Beacon: {}", url);
    }
}

/// Substitute the VAST `[CACHEBUSTING]` macro with a random 8-digit number
pub fn expand_cache_busting(url: &str) -> String {
    if !url.contains("[CACHEBUSTING]") {
        return url.to_string();
    }
    let value: u32 = rand::thread_rng().gen_range(10_000_000..100_000_000);
    url.replace("[CACHEBUSTING]", &value.to_string())
}

/// Substitute the VAST `[ERRORCODE]` macro
pub fn expand_error_code(url: &str, code: u16) -> String {
    url.replace("[ERRORCODE]", &code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_busting_is_eight_digits() {
        let url = expand_cache_busting("https://t.example.com/imp?cb=[CACHEBUSTING]");
        let value = url.trim_start_matches("https://t.example.com/imp?cb=");
        assert_eq!(value.len(), 8);
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn urls_without_macros_are_untouched() {
        assert_eq!(expand_cache_busting("https://t.example.com/a"), "https://t.example.com/a");
        assert_eq!(
            expand_error_code("https://t.example.com/err?code=[ERRORCODE]", 400),
            "https://t.example.com/err?code=400"
        );
    }

    #[tokio::test]
    async fn http_dispatcher_swallows_failures() {
        let dispatcher = HttpBeaconDispatcher::current(BeaconConfig {
            timeout: Duration::from_millis(50),
            cache_busting: true,
        })
        .unwrap();

        // Neither an unroutable host nor a garbage URL may panic or block
        dispatcher.send("http://127.0.0.1:9/track?cb=[CACHEBUSTING]");
        dispatcher.send("not a url");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
