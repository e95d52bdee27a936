use super::{Fetcher, Result};
use async_trait::async_trait;
use std::time::Duration;

/// `mock` strategy: sleeps, then yields an empty result. Never touches the network.
pub struct MockFetcher {
    delay: Duration,
}

impl MockFetcher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl<P> Fetcher<P> for MockFetcher
where
    P: Send + 'static,
{
    async fn fetch(&self, _url: &str) -> Result<Option<P>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }
}
