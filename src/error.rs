//! Error types for the PLATE-VS client.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by [`crate::client::PlateVsClient`].
///
/// Two kinds matter to callers: `Validation` (bad input, rejected before
/// any network call) and everything else, which covers one failed
/// request/response cycle. Status probes never return these; the batch
/// download collects them per item instead of aborting.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any request was issued.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Init(#[source] reqwest::Error),

    /// The request could not be completed (connect failure, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be parsed (bad JSON, bad CSV, empty export).
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// A downloaded file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors raised before any network I/O took place.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
