//! HTTP transport port trait.
//!
//! The remote data client only needs a blocking GET that returns the body
//! text; caching, throttling and authentication live above this seam.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            message: format!("unexpected HTTP status {status}"),
        }
    }
}

pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<String, TransportError>;
}
