//! Two-pass synchronization over a URL list.

use httpcache_client::{Transport, get};
use httpcache_core::headers::USER_AGENT;
use httpcache_core::{HttpCache, Request};
use std::time::{Duration, Instant};

/// Timing and outcome of one pass over the URL list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
}

/// Build one request per URL, identified by `user_agent`.
pub fn build_requests(urls: &[String], user_agent: &str) -> Vec<Request> {
    urls.iter().map(|url| Request::new(url.as_str()).with_header(USER_AGENT, user_agent)).collect()
}

/// GET every request through the cache. Failures are logged and skipped.
pub async fn run_pass<T>(transport: &T, cache: &mut HttpCache, requests: &[Request]) -> PassReport
where
    T: Transport + ?Sized,
{
    let start = Instant::now();
    let mut report = PassReport::default();

    for request in requests {
        match get(transport, cache, request).await {
            Ok(response) => {
                tracing::debug!("{} -> {} ({} bytes)", request.url, response.status, response.text.len());
                report.succeeded += 1;
            }
            Err(e) => {
                tracing::error!("{}: {}", request.url, e);
                report.failed += 1;
            }
        }
    }

    report.elapsed = start.elapsed();
    report
}

/// Cached pass time as a percentage of the fresh pass.
pub fn ratio_percent(fresh: Duration, cached: Duration) -> Option<f64> {
    (!fresh.is_zero()).then(|| 100.0 * cached.as_secs_f64() / fresh.as_secs_f64())
}
