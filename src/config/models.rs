use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::{CurlConfig, FetchConfig, HttpConfig, METHOD_FETCH};
use crate::worker::{DEFAULT_CONCURRENCY_LIMIT, DEFAULT_RETRY_ATTEMPT, TaskOptions};

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub curl: CurlSettings,
    #[serde(default)]
    pub mock: MockSettings,
}

impl Settings {
    pub fn task_options(&self) -> TaskOptions {
        TaskOptions::builder()
            .retry_attempt(self.download.retry_attempt)
            .method(self.download.method.clone())
            .concurrency_limit(self.download.concurrency_limit)
            .limiter(self.download.limiter)
            .log(self.download.log)
            .build()
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            http: HttpConfig {
                connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.http.request_timeout_secs),
                user_agent: self.http.user_agent.clone(),
                max_redirects: self.http.max_redirects,
                proxy: self.http.proxy.clone(),
            },
            curl: CurlConfig {
                binary: self.curl.binary.clone(),
                args: self.curl.args.clone(),
            },
            mock_delay: Duration::from_millis(self.mock.delay_ms),
        }
    }
}

/// Retry and concurrency knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadSettings {
    #[serde(default = "default_retry_attempt")]
    pub retry_attempt: u32,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_true")]
    pub limiter: bool,
    #[serde(default = "default_true")]
    pub log: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            retry_attempt: default_retry_attempt(),
            method: default_method(),
            concurrency_limit: default_concurrency_limit(),
            limiter: true,
            log: true,
        }
    }
}

fn default_retry_attempt() -> u32 {
    DEFAULT_RETRY_ATTEMPT
}

fn default_method() -> String {
    METHOD_FETCH.to_string()
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}

fn default_true() -> bool {
    true
}

/// Where results, the failure ledger and the missing list go
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_failed_output")]
    pub failed_output: PathBuf,
    #[serde(default = "default_missing_output")]
    pub missing_output: PathBuf,
    #[serde(default)]
    pub skip_existing: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            failed_output: default_failed_output(),
            missing_output: default_missing_output(),
            skip_existing: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("result")
}

fn default_failed_output() -> PathBuf {
    PathBuf::from("failed.txt")
}

fn default_missing_output() -> PathBuf {
    PathBuf::from("missing.txt")
}

/// HTTP client settings for the `fetch` method
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Proxy URL (may carry credentials; also read from `FETCHBATCH_PROXY`)
    #[serde(skip_serializing)]
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            proxy: None,
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    HttpConfig::default().user_agent
}

fn default_max_redirects() -> usize {
    10
}

/// External client settings for the `curl` method
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurlSettings {
    #[serde(default = "default_curl_binary")]
    pub binary: String,
    #[serde(default = "default_curl_args")]
    pub args: Vec<String>,
}

impl Default for CurlSettings {
    fn default() -> Self {
        Self {
            binary: default_curl_binary(),
            args: default_curl_args(),
        }
    }
}

fn default_curl_binary() -> String {
    CurlConfig::default().binary
}

fn default_curl_args() -> Vec<String> {
    CurlConfig::default().args
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockSettings {
    #[serde(default = "default_mock_delay_ms")]
    pub delay_ms: u64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_mock_delay_ms(),
        }
    }
}

fn default_mock_delay_ms() -> u64 {
    2000
}
