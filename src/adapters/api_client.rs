//! Rate-limited, disk-cached API client.
//!
//! Every response body is stored as pretty-printed JSON under
//! `<cache_dir>/api<path>.json`; the file's modification time is its write
//! timestamp. A cached body younger than the caller's TTL is served without a
//! request. Live requests are spaced by a global minimum interval regardless
//! of path. In offline mode only the disk cache is consulted, whatever its age.
//!
//! Transport failures are returned, not retried.

use crate::domain::error::SnrError;
use crate::ports::http_port::HttpTransport;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Enforces a minimum interval between consecutive live requests.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Blocks until `min_interval` has passed since the previous call, then
    /// records this call as the latest request.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                debug!(delay_ms = delay.as_millis() as u64, "throttling request");
                thread::sleep(delay);
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub host: String,
    pub api_key: String,
    pub cache_dir: PathBuf,
    pub min_interval: Duration,
    pub offline: bool,
}

pub struct ApiClient {
    transport: Box<dyn HttpTransport>,
    config: ApiClientConfig,
    throttle: Throttle,
    live_requests: usize,
}

impl ApiClient {
    pub fn new(transport: Box<dyn HttpTransport>, config: ApiClientConfig) -> Self {
        Self {
            transport,
            throttle: Throttle::new(config.min_interval),
            config,
            live_requests: 0,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.config.offline
    }

    /// Number of requests sent to the transport by this client.
    pub fn live_requests(&self) -> usize {
        self.live_requests
    }

    pub fn cache_file(&self, path: &str) -> PathBuf {
        self.config
            .cache_dir
            .join("api")
            .join(format!("{}.json", path.trim_start_matches('/')))
    }

    pub fn fetch(&mut self, path: &str, ttl: Duration) -> Result<Value, SnrError> {
        let cache_file = self.cache_file(path);

        if self.config.offline {
            return read_cached(&cache_file).ok_or_else(|| SnrError::Unavailable {
                path: path.to_string(),
            });
        }

        if file_age(&cache_file).is_some_and(|age| age < ttl) {
            if let Some(value) = read_cached(&cache_file) {
                debug!(path, "serving response from cache");
                return Ok(value);
            }
        }

        let value = self.request(path)?;
        if let Err(e) = write_cached(&cache_file, &value) {
            warn!(path, error = %e, "could not write response cache");
        }
        Ok(value)
    }

    fn request(&mut self, path: &str) -> Result<Value, SnrError> {
        self.throttle.wait();
        info!(path, "requesting from API");
        self.live_requests += 1;

        // The key goes in the query string; never log the full URL.
        let url = format!(
            "https://{}{}?authKey={}",
            self.config.host, path, self.config.api_key
        );
        let body = self
            .transport
            .get(&url)
            .map_err(|e| SnrError::TransportFailure {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|e| SnrError::TransportFailure {
            path: path.to_string(),
            reason: format!("invalid JSON response: {e}"),
        })
    }
}

fn file_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    // A timestamp in the future counts as brand new.
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

fn read_cached(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt response cache");
            None
        }
    }
}

fn write_cached(path: &Path, value: &Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let pretty = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    fs::write(path, pretty)
}
