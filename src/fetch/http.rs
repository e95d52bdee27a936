//! HTTP fetch strategy

use super::{FetchError, Fetcher, Result, decode_payload};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: concat!("fetchbatch/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
            proxy: None,
        }
    }
}

/// `fetch` strategy: plain HTTP GET, body decoded as JSON
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));

        if let Some(url) = &config.proxy {
            let proxy = Proxy::all(url)
                .map_err(|e| FetchError::InvalidUrl(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self { client })
    }

    async fn get_body(&self, url: &str) -> Result<(StatusCode, Bytes)> {
        debug!(url, "Sending request");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_redirect() {
                FetchError::TooManyRedirects
            } else if e.is_builder() {
                FetchError::InvalidUrl(url.to_string())
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("Failed to read body: {}", e)))?;

        debug!(url, status = status.as_u16(), size = bytes.len(), "Response received");

        Ok((status, bytes))
    }
}

#[async_trait]
impl<P> Fetcher<P> for HttpFetcher
where
    P: DeserializeOwned + Send + 'static,
{
    /// Error statuses still count as a result when their body is JSON; the
    /// status only becomes the error when the body cannot be decoded.
    async fn fetch(&self, url: &str) -> Result<Option<P>> {
        let (status, body) = self.get_body(url).await?;
        match decode_payload(&body) {
            Err(_) if !status.is_success() => Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }),
            decoded => decoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("fetchbatch/"));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = HttpConfig {
            proxy: Some("http://[::1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/region/7301"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "7301"})))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let payload: Option<Value> = fetcher
            .fetch(&format!("{}/region/7301", server.uri()))
            .await
            .unwrap();

        assert_eq!(payload, Some(json!({"code": "7301"})));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let result: Result<Option<Value>> = fetcher.fetch(&server.uri()).await;

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_fetch_error_status_with_json_body_is_a_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let payload: Option<Value> = fetcher.fetch(&server.uri()).await.unwrap();

        assert_eq!(payload, Some(json!({"success": false})));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let result: Result<Option<Value>> = fetcher.fetch(&server.uri()).await;

        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
