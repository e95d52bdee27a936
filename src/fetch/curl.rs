//! External client fetch strategy

use super::{FetchError, Fetcher, Result, decode_payload};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

/// External HTTP client invocation: `<binary> <args...> <url>`
#[derive(Debug, Clone)]
pub struct CurlConfig {
    pub binary: String,
    pub args: Vec<String>,
}

impl Default for CurlConfig {
    fn default() -> Self {
        Self {
            binary: "curl".to_string(),
            args: vec!["-sSfL".to_string()],
        }
    }
}

/// `curl` strategy: runs the client, decodes its stdout as JSON
pub struct CurlFetcher {
    config: CurlConfig,
}

impl CurlFetcher {
    pub fn new(config: CurlConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<P> Fetcher<P> for CurlFetcher
where
    P: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, url: &str) -> Result<Option<P>> {
        debug!(binary = %self.config.binary, url, "Spawning external client");

        let output = Command::new(&self.config.binary)
            .args(&self.config.args)
            .arg(url)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                FetchError::Process(format!("failed to spawn {}: {}", self.config.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Process(format!(
                "{} exited with {}: {}",
                self.config.binary,
                output.status,
                stderr.trim()
            )));
        }

        decode_payload(&output.stdout)
    }
}
