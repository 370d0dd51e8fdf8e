//! HTTP transport used by the cache orchestrator.
//!
//! The orchestrator talks to the network only through [`Transport`], so the
//! cache logic can be driven by a stub in tests and by [`ReqwestTransport`]
//! everywhere else.
//!
//! ### Request construction
//! - URL is canonicalized (scheme default, lowercase host, no fragment)
//! - Encoded parameters are appended to the query string
//! - Every request header is sent as-is
//!
//! ### Response collection
//! - Any status is returned, including 304 and error codes
//! - Repeated header names are joined with `", "`
//! - Elapsed time covers send through full body read

pub mod url;

use async_trait::async_trait;
use httpcache_core::{AppConfig, Error, Headers, Request, Response};
use reqwest::{Client, header::HeaderMap};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize, request_url};

/// Performs one GET exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return whatever the origin answered.
    ///
    /// Non-2xx statuses are responses, not errors. Only connection, timeout,
    /// and URL failures become [`Error::Transport`].
    async fn get(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Fallback User-Agent when a request does not carry one (default: "httpcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { user_agent: "httpcache/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl From<&AppConfig> for TransportConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: config.max_redirects }
    }
}

/// [`Transport`] backed by a pooled reqwest client.
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = request_url(&request.url, &request.parameters)
            .map_err(|e| Error::Transport(format!("{}: {e}", request.url)))?;

        let mut outgoing = self.http.get(url.as_str());
        for (name, value) in request.headers.iter() {
            outgoing = outgoing.header(name, value);
        }

        let response = outgoing.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());
        let text = response.text().await.map_err(transport_error)?;
        let elapsed = start.elapsed();

        tracing::debug!("GET {} -> {} {} in {}ms ({} bytes)", url, final_url, status, elapsed.as_millis(), text.len());

        Ok(Response { status, text, headers, url: final_url, elapsed })
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Transport(format!("timeout: {e}"))
    } else if e.is_builder() {
        Error::Transport(format!("invalid request: {e}"))
    } else {
        Error::Transport(format!("network error: {e}"))
    }
}

/// Flatten a header map, joining repeated names with `", "`.
fn collect_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for name in map.keys() {
        let joined = map
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        headers.insert(name.as_str(), joined);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.user_agent, "httpcache/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_transport_config_from_app_config() {
        let app = AppConfig { user_agent: "sync/2".to_string(), timeout_ms: 1500, max_redirects: 0, ..Default::default() };
        let config = TransportConfig::from(&app);
        assert_eq!(config.user_agent, "sync/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_redirects, 0);
    }

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = HeaderMap::new();
        map.append("vary", HeaderValue::from_static("Accept"));
        map.append("vary", HeaderValue::from_static("User-Agent"));
        map.insert("etag", HeaderValue::from_static("\"v1\""));

        let headers = collect_headers(&map);
        assert_eq!(headers.get("Vary"), Some("Accept, User-Agent"));
        assert_eq!(headers.get("ETag"), Some("\"v1\""));
    }

    #[tokio::test]
    async fn test_transport_new() {
        let transport = ReqwestTransport::new(&TransportConfig::default());
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = ReqwestTransport::new(&TransportConfig::default()).unwrap();
        let result = transport.get(&Request::new("ftp://example.com/file")).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
