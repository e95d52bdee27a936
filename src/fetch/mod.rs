//! Fetch interface
//!
//! A [`Fetcher`] performs exactly one retrieval for one URL and returns the
//! decoded payload. Strategies are registered under string tags in a
//! [`FetcherRegistry`]:
//!
//! - `fetch` - HTTP GET through `reqwest` (default)
//! - `curl` - external HTTP client process, stdout decoded as JSON
//! - `mock` - waits a fixed delay, then yields an empty result
//!
//! Unknown tags resolve to `fetch`. Retrying is the caller's job; a fetcher
//! never retries on its own.

mod curl;
mod http;
mod mock;
mod registry;

pub use curl::{CurlConfig, CurlFetcher};
pub use http::{HttpConfig, HttpFetcher};
pub use mock::MockFetcher;
pub use registry::{FetchConfig, FetcherRegistry, RegistryError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const METHOD_FETCH: &str = "fetch";
pub const METHOD_CURL: &str = "curl";
pub const METHOD_MOCK: &str = "mock";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("External client failed: {0}")]
    Process(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// One retrieval for one URL.
///
/// `Ok(None)` is an empty result: the resource answered but carried no
/// payload (a JSON `null` body, or the mock strategy). Callers neither save
/// nor report an empty result.
#[async_trait]
pub trait Fetcher<P>: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<P>>;
}

/// Decode a JSON body, mapping `null` to an empty result
pub(crate) fn decode_payload<P: DeserializeOwned>(body: &[u8]) -> Result<Option<P>> {
    Ok(serde_json::from_slice::<Option<P>>(body)?)
}
