//! Conditional revalidation of stale entries.
//!
//! A stale entry is checked with the origin by re-sending its request with
//! the validators the entry holds. The origin's status decides what happens
//! to the entry:
//!
//! | status | entry                                   | caller receives        |
//! |--------|-----------------------------------------|------------------------|
//! | 304    | timestamp and validators refreshed      | cached body            |
//! | 200    | replaced by the new response            | new response           |
//! | other  | removed                                 | origin response as-is  |
//!
//! A transport failure leaves the entry untouched.

use crate::transport::Transport;
use chrono::Utc;
use httpcache_core::headers::{CONNECTION, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use httpcache_core::{CacheEntry, Error, Headers, HttpCache, Request, Response};

pub(crate) const KEEP_ALIVE: &str = "Keep-Alive";

/// What a revalidation exchange concluded about a stale entry.
#[derive(Debug)]
pub enum Revalidated {
    /// 304: the entry was refreshed in place; carries the cached response.
    NotModified(Response),
    /// 304, but the cached body could not be read back.
    Unreadable(Error),
    /// 200: the origin sent a replacement.
    Changed(Response),
    /// Any other status: the entry is no longer usable.
    Invalidated(Response),
}

/// The conditional request sent to revalidate `entry`.
///
/// `If-None-Match` and `If-Modified-Since` are added only when the entry
/// holds the matching validator.
pub fn validation_request(request: &Request, entry: &CacheEntry) -> Request {
    let mut conditional = Headers::new();
    if let Some(etag) = entry.headers.get(ETAG) {
        conditional.insert(IF_NONE_MATCH, etag);
    }
    if let Some(last_modified) = entry.headers.get(LAST_MODIFIED) {
        conditional.insert(IF_MODIFIED_SINCE, last_modified);
    }
    conditional.insert(CONNECTION, KEEP_ALIVE);

    let mut validation = request.clone();
    validation.merge_headers(conditional);
    validation
}

/// Ask the origin whether `entry` is still current.
///
/// On 304 the entry is refreshed here; replacing or removing it for the
/// other outcomes is left to [`apply`], which needs the whole cache.
pub async fn revalidate<T>(transport: &T, request: &Request, entry: &mut CacheEntry) -> Result<Revalidated, Error>
where
    T: Transport + ?Sized,
{
    let validation = validation_request(request, entry);
    let response = transport.get(&validation).await?;

    let outcome = match response.status {
        304 => {
            entry.refresh(Utc::now().timestamp(), &response.headers);
            match entry.response() {
                Ok(cached) => Revalidated::NotModified(cached.clone()),
                Err(e) => Revalidated::Unreadable(e),
            }
        }
        200 => Revalidated::Changed(response),
        _ => Revalidated::Invalidated(response),
    };
    Ok(outcome)
}

/// Bring the index in line with `outcome` and return the response to serve.
///
/// [`Revalidated::Unreadable`] is returned as an error after the entry is
/// dropped, so the caller can refetch unconditionally.
pub fn apply(cache: &mut HttpCache, request: &Request, outcome: Revalidated) -> Result<Response, Error> {
    match outcome {
        Revalidated::NotModified(cached) => {
            tracing::info!("validated resource: {}", request.url);
            Ok(cached)
        }
        Revalidated::Changed(response) => {
            tracing::info!("updated resource: {}", request.url);
            cache.delete(request);
            cache.put(request.clone(), response.clone())?;
            Ok(response)
        }
        Revalidated::Invalidated(response) => {
            tracing::info!("invalidated resource: {} (status {})", request.url, response.status);
            cache.delete(request);
            Ok(response)
        }
        Revalidated::Unreadable(e) => {
            tracing::warn!("dropping unreadable entry for {}: {}", request.url, e);
            cache.delete(request);
            Err(e)
        }
    }
}
