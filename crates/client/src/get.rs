//! Cache-aware GET.
//!
//! Every call classifies the request against the cache and takes one path:
//!
//! - FRESH: the entry is served from disk without touching the network
//! - STALE: the entry is revalidated with a conditional request
//! - ABSENT: the resource is fetched and a `200` is stored
//!
//! The cache is borrowed mutably for the whole call, so no other operation
//! can observe it between the lookup and the index update.

use crate::revalidate::{self, KEEP_ALIVE, Revalidated};
use crate::transport::Transport;
use httpcache_core::cache::{AlwaysCacheable, CacheabilityPolicy, is_stale};
use httpcache_core::headers::CONNECTION;
use httpcache_core::{Error, Headers, HttpCache, Request, Response};

/// GET `request` through `cache`, storing every `200` response.
pub async fn get<T>(transport: &T, cache: &mut HttpCache, request: &Request) -> Result<Response, Error>
where
    T: Transport + ?Sized,
{
    get_with_policy(transport, cache, request, &AlwaysCacheable).await
}

/// [`get`] with a custom policy deciding which `200` responses are stored.
///
/// Errors:
/// - [`Error::Transport`] when the origin could not be reached; the cache is unchanged
/// - [`Error::Parse`] when a stale check hits an unparseable `Expires`
/// - [`Error::Storage`] when a new response could not be persisted
pub async fn get_with_policy<T, P>(
    transport: &T, cache: &mut HttpCache, request: &Request, policy: &P,
) -> Result<Response, Error>
where
    T: Transport + ?Sized,
    P: CacheabilityPolicy + ?Sized,
{
    let Some(entry) = cache.find_mut(request) else {
        return fetch(transport, cache, request, policy).await;
    };

    if !is_stale(entry)? {
        match entry.response() {
            Ok(cached) => {
                tracing::info!("cached resource: {}", request.url);
                return Ok(cached.clone());
            }
            Err(e) => {
                tracing::warn!("cached body for {} unreadable, refetching: {}", request.url, e);
                cache.delete(request);
                return fetch(transport, cache, request, policy).await;
            }
        }
    }

    match revalidate::revalidate(transport, request, entry).await? {
        Revalidated::Unreadable(e) => {
            tracing::warn!("cached body for {} unreadable after 304, refetching: {}", request.url, e);
            cache.delete(request);
            fetch(transport, cache, request, policy).await
        }
        outcome => revalidate::apply(cache, request, outcome),
    }
}

/// ABSENT path: unconditional fetch, storing a cacheable `200`.
async fn fetch<T, P>(transport: &T, cache: &mut HttpCache, request: &Request, policy: &P) -> Result<Response, Error>
where
    T: Transport + ?Sized,
    P: CacheabilityPolicy + ?Sized,
{
    let mut fetch_request = request.clone();
    fetch_request.merge_headers(Headers::from([(CONNECTION, KEEP_ALIVE)]));

    let response = transport.get(&fetch_request).await?;

    if !response.is_ok() {
        tracing::info!("invalid resource: {} (status {})", request.url, response.status);
    } else if policy.is_cacheable(&response) {
        tracing::info!("new resource: {}", request.url);
        cache.put(fetch_request, response.clone())?;
    } else {
        tracing::info!("not cached: {} rejected by cacheability policy", request.url);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;
    use httpcache_core::headers::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
    use tempfile::tempdir;

    const URL: &str = "https://repository.example.com/v1/info.meta";

    fn request() -> Request {
        Request::new(URL).with_header("User-Agent", "httpcache-test/1")
    }

    fn ok(body: &str) -> Response {
        Response::new(200, URL).with_text(body)
    }

    struct NeverCacheable;

    impl CacheabilityPolicy for NeverCacheable {
        fn is_cacheable(&self, _response: &Response) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_absent_200_is_stored() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        let transport = StubTransport::new([Ok(ok("fresh body").with_header("ETag", "\"v1\""))]);

        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.text, "fresh body");
        assert_eq!(transport.requests()[0].headers.get(CONNECTION), Some(KEEP_ALIVE));
        let entry = cache.find(&request()).unwrap();
        assert_eq!(entry.headers.get("ETag"), Some("\"v1\""));
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_absent_non_200_is_not_stored() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        let transport = StubTransport::new([Ok(Response::new(404, URL).with_text("missing"))]);

        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.status, 404);
        assert_eq!(served.text, "missing");
        assert!(cache.is_empty());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_policy_can_refuse_storage() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        let transport = StubTransport::new([Ok(ok("body"))]);

        let served = get_with_policy(&transport, &mut cache, &request(), &NeverCacheable).await.unwrap();

        assert_eq!(served.status, 200);
        assert!(cache.is_empty());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_served_without_network() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("cached body").with_header("Cache-Control", "max-age=3600")).unwrap();
        let transport = StubTransport::new([]);

        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.text, "cached body");
        assert_eq!(served.header("Cache-Control"), Some("max-age=3600"));
        assert_eq!(transport.calls(), 0);
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_survives_reopen() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("persisted").with_header("Cache-Control", "max-age=3600")).unwrap();
        cache.close().unwrap();

        let mut cache = HttpCache::open(dir.path()).unwrap();
        let transport = StubTransport::new([]);
        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.text, "persisted");
        assert_eq!(transport.calls(), 0);
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_stale_304_serves_cached_body_with_new_validators() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache
            .put(
                request(),
                ok("v1 body")
                    .with_header("ETag", "\"abc\"")
                    .with_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT")
                    .with_header("Cache-Control", "max-age=60"),
            )
            .unwrap();
        cache.find_mut(&request()).unwrap().timestamp = 0;
        let path = cache.find(&request()).unwrap().path().to_path_buf();

        let transport = StubTransport::new([Ok(Response::new(304, URL).with_header("ETag", "\"abd\""))]);
        let before = chrono::Utc::now().timestamp();

        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.status, 200);
        assert_eq!(served.text, "v1 body");
        assert_eq!(served.header("ETag"), Some("\"abd\""));

        let sent = &transport.requests()[0];
        assert_eq!(sent.headers.get(IF_NONE_MATCH), Some("\"abc\""));
        assert_eq!(sent.headers.get(IF_MODIFIED_SINCE), Some("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(sent.headers.get(CONNECTION), Some(KEEP_ALIVE));

        let entry = cache.find(&request()).unwrap();
        assert!(entry.timestamp >= before);
        assert_eq!(entry.headers.get("ETag"), Some("\"abd\""));
        assert_eq!(entry.path(), path);
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_stale_200_replaces_entry() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("v1 body").with_header("ETag", "\"v1\"")).unwrap();
        let old_path = cache.find(&request()).unwrap().path().to_path_buf();

        let transport = StubTransport::new([Ok(ok("v2 body").with_header("ETag", "\"v2\""))]);
        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.text, "v2 body");
        assert!(!old_path.exists());
        assert_eq!(cache.len(), 1);
        let entry = cache.find_mut(&request()).unwrap();
        assert_eq!(entry.headers.get("ETag"), Some("\"v2\""));
        assert_eq!(entry.response().unwrap().text, "v2 body");
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_stale_500_removes_entry() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("v1 body").with_header("ETag", "\"v1\"")).unwrap();
        let old_path = cache.find(&request()).unwrap().path().to_path_buf();

        let transport = StubTransport::new([Ok(Response::new(500, URL).with_text("oops"))]);
        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.status, 500);
        assert_eq!(served.text, "oops");
        assert!(cache.find(&request()).is_none());
        assert!(!old_path.exists());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_cache_unchanged() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("v1 body").with_header("ETag", "\"v1\"")).unwrap();
        cache.find_mut(&request()).unwrap().timestamp = 42;

        let transport = StubTransport::new([Err(Error::Transport("timeout".into()))]);
        let result = get(&transport, &mut cache, &request()).await;

        assert!(matches!(result, Err(Error::Transport(_))));
        let entry = cache.find(&request()).unwrap();
        assert_eq!(entry.timestamp, 42);
        assert!(entry.path().exists());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_absent_transport_failure_stores_nothing() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        let transport = StubTransport::new([Err(Error::Transport("dns".into()))]);

        assert!(get(&transport, &mut cache, &request()).await.is_err());
        assert!(cache.is_empty());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_unparseable_expires_is_reported() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("v1 body").with_header("Expires", "0")).unwrap();
        let transport = StubTransport::new([]);

        let result = get(&transport, &mut cache, &request()).await;

        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(transport.calls(), 0);
        assert!(cache.find(&request()).is_some());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_with_missing_body_is_refetched() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("v1 body").with_header("Cache-Control", "max-age=3600")).unwrap();
        cache.close().unwrap();

        let mut cache = HttpCache::open(dir.path()).unwrap();
        let path = cache.find(&request()).unwrap().path().to_path_buf();
        std::fs::remove_file(&path).unwrap();

        let transport = StubTransport::new([Ok(ok("v2 body"))]);
        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.text, "v2 body");
        assert_eq!(transport.calls(), 1);
        assert!(!transport.requests()[0].headers.contains(IF_NONE_MATCH));
        assert!(cache.find(&request()).is_some());
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_not_modified_with_missing_body_is_refetched() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        cache.put(request(), ok("v1 body").with_header("ETag", "\"v1\"")).unwrap();
        cache.close().unwrap();

        let mut cache = HttpCache::open(dir.path()).unwrap();
        std::fs::remove_file(cache.find(&request()).unwrap().path()).unwrap();

        let transport = StubTransport::new([Ok(Response::new(304, URL)), Ok(ok("v2 body"))]);
        let served = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(served.text, "v2 body");
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].headers.get(IF_NONE_MATCH), Some("\"v1\""));
        assert!(!sent[1].headers.contains(IF_NONE_MATCH));
        assert_eq!(cache.len(), 1);
        cache.close().unwrap();
    }

    #[tokio::test]
    async fn test_second_get_uses_cache() {
        let dir = tempdir().unwrap();
        let mut cache = HttpCache::open(dir.path()).unwrap();
        let transport = StubTransport::new([Ok(ok("body").with_header("Cache-Control", "public, max-age=300"))]);

        get(&transport, &mut cache, &request()).await.unwrap();
        let second = get(&transport, &mut cache, &request()).await.unwrap();

        assert_eq!(second.text, "body");
        assert_eq!(transport.calls(), 1);
        cache.close().unwrap();
    }
}
