//! Blocking HTTP transport.

use crate::ports::http_port::{HttpTransport, TransportError};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(feature = "remote")]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<String, TransportError> {
        // The URL carries the API key, so it is stripped from every error.
        let response = self.client.get(url).send().map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                TransportError::new(format!("request timeout: {e}"))
            } else {
                TransportError::new(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(status.as_u16()));
        }
        response
            .text()
            .map_err(|e| TransportError::new(format!("failed to read body: {}", e.without_url())))
    }
}

/// Stand-in used when the crate is built without network support.
#[cfg(not(feature = "remote"))]
pub struct ReqwestTransport;

#[cfg(not(feature = "remote"))]
impl ReqwestTransport {
    pub fn new(_timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self)
    }
}

#[cfg(not(feature = "remote"))]
impl HttpTransport for ReqwestTransport {
    fn get(&self, _url: &str) -> Result<String, TransportError> {
        Err(TransportError::new(
            "built without the `remote` feature; only cached responses are available",
        ))
    }
}
