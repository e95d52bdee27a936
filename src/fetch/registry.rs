use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use super::{
    CurlConfig, CurlFetcher, Fetcher, HttpConfig, HttpFetcher, METHOD_CURL, METHOD_FETCH,
    METHOD_MOCK, MockFetcher,
};

/// Settings for the built-in strategies
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub http: HttpConfig,
    pub curl: CurlConfig,
    pub mock_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            curl: CurlConfig::default(),
            mock_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("fetch strategy not found: {0}")]
    NotFound(String),
}

/// Registry mapping method tags to fetch strategies
pub struct FetcherRegistry<P> {
    fetchers: BTreeMap<String, Arc<dyn Fetcher<P>>>,
}

impl<P> FetcherRegistry<P> {
    pub fn new() -> Self {
        Self {
            fetchers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, method: impl Into<String>, fetcher: Arc<dyn Fetcher<P>>) {
        self.fetchers.insert(method.into(), fetcher);
    }

    pub fn get(&self, method: &str) -> Result<Arc<dyn Fetcher<P>>, RegistryError> {
        self.fetchers
            .get(method)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(method.to_string()))
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.fetchers.keys().map(String::as_str)
    }

    /// Look up a strategy, falling back to `fetch` for unknown tags
    pub fn resolve(&self, method: &str) -> Result<Arc<dyn Fetcher<P>>, RegistryError> {
        if let Some(fetcher) = self.fetchers.get(method) {
            return Ok(fetcher.clone());
        }

        warn!(method, fallback = METHOD_FETCH, "Unknown fetch method, falling back");
        self.get(METHOD_FETCH)
    }
}

impl<P> Default for FetcherRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> FetcherRegistry<P>
where
    P: DeserializeOwned + Send + 'static,
{
    /// Registry with the `fetch`, `curl` and `mock` strategies
    pub fn with_defaults(config: &FetchConfig) -> super::Result<Self> {
        let mut registry = Self::new();

        registry.register(METHOD_FETCH, Arc::new(HttpFetcher::new(&config.http)?));
        registry.register(METHOD_CURL, Arc::new(CurlFetcher::new(config.curl.clone())));
        registry.register(METHOD_MOCK, Arc::new(MockFetcher::new(config.mock_delay)));

        Ok(registry)
    }
}
