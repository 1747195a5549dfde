use crate::error::{AdError, Result};
use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Retrieves the raw VAST document for a source
pub trait VastFetcher {
    fn fetch(&self, source: &str) -> impl Future<Output = Result<String>>;
}

/// Settings for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

/// Fetches VAST over HTTP, or from disk for `file://` URLs and plain paths
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch_url(&self, url: &str) -> Result<String> {
        // Random request ID to correlate log lines
        let req_id: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        let url = url::Url::parse(url)?;
        debug!("[{}] Fetching VAST from {}", req_id, url);
        let start_time = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            debug!("[{}] Request failed after {:?}", req_id, start_time.elapsed());
            AdError::Fetch(format!("Failed to fetch URL: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AdError::Fetch(format!(
                "Failed to fetch URL: HTTP status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdError::Fetch(format!("Failed to read response body: {}", e)))?;

        info!("[{}] VAST fetched in {:?}", req_id, start_time.elapsed());
        Ok(body)
    }
}

impl VastFetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> Result<String> {
        if let Some(path) = local_path(source) {
            debug!("Reading VAST from {}", path.display());
            return Ok(tokio::fs::read_to_string(path).await?);
        }
        self.fetch_url(source).await
    }
}

/// Resolve `file://` URLs and existing paths to a filesystem path
fn local_path(source: &str) -> Option<PathBuf> {
    if let Some(path) = source.strip_prefix("file://") {
        #[cfg(target_os = "windows")]
        let path = path.trim_start_matches('/');
        return Some(PathBuf::from(path));
    }
    if Path::new(source).exists() {
        return Some(PathBuf::from(source));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_local_files() {
        let path = std::env::temp_dir().join(format!("vast-fetch-{}.xml", std::process::id()));
        tokio::fs::write(&path, "<VAST/>").await.unwrap();

        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let plain = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        let file_url = fetcher
            .fetch(&format!("file://{}", path.display()))
            .await
            .unwrap();
        assert_eq!(plain, "<VAST/>");
        assert_eq!(file_url, "<VAST/>");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_invalid_urls() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let err = fetcher.fetch("definitely not a url").await.unwrap_err();
        assert!(matches!(err, AdError::Url(_)));
    }
}
