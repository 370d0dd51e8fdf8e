//! Freshness and cacheability decisions.
//!
//! Staleness is decided from the entry's header snapshot only:
//!
//! 1. `Cache-Control` present with `max-age`: stale once `now` passes
//!    `timestamp + max-age`.
//! 2. `Cache-Control` absent and `Expires` present: stale once `Expires` is
//!    in the past.
//! 3. Anything else is stale.
//!
//! A `Cache-Control` header without `max-age` lands in case 3 even when an
//! `Expires` header is present.

use super::entry::CacheEntry;
use super::http_date::parse_http_date;
use crate::Error;
use crate::headers::{CACHE_CONTROL, EXPIRES, Headers};
use crate::response::Response;
use chrono::{DateTime, Utc};

/// Parsed `Cache-Control` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub public: bool,
    pub private: bool,
    pub no_cache: bool,
    pub no_store: bool,
    /// Seconds; the last `max-age` directive wins.
    pub max_age: Option<u64>,
}

impl CacheControl {
    pub fn parse(value: &str) -> Self {
        let mut cc = CacheControl::default();

        for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("public") {
                cc.public = true;
            } else if token.eq_ignore_ascii_case("private") {
                cc.private = true;
            } else if token.eq_ignore_ascii_case("no-cache") {
                cc.no_cache = true;
            } else if token.eq_ignore_ascii_case("no-store") {
                cc.no_store = true;
            } else if let Some((name, seconds)) = token.split_once('=')
                && name.eq_ignore_ascii_case("max-age")
                && !seconds.is_empty()
                && seconds.bytes().all(|b| b.is_ascii_digit())
                && let Ok(seconds) = seconds.parse::<u64>()
            {
                cc.max_age = Some(seconds);
            }
        }

        cc
    }

    /// Parse the `Cache-Control` header of `headers`, if there is one.
    pub fn from_headers(headers: &Headers) -> Option<Self> {
        headers.get(CACHE_CONTROL).map(Self::parse)
    }
}

/// Whether `entry` must be revalidated before it is served.
pub fn is_stale(entry: &CacheEntry) -> Result<bool, Error> {
    is_stale_at(entry, Utc::now())
}

/// [`is_stale`] evaluated against an explicit clock.
///
/// Fails only when the `Expires` branch is taken and the date is unparseable.
pub fn is_stale_at(entry: &CacheEntry, now: DateTime<Utc>) -> Result<bool, Error> {
    if let Some(cc) = CacheControl::from_headers(&entry.headers) {
        let Some(max_age) = cc.max_age else {
            return Ok(true);
        };
        let limit = i64::try_from(max_age)
            .ok()
            .and_then(|max_age| entry.timestamp.checked_add(max_age))
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        // A limit past the representable range never expires.
        return Ok(limit.is_some_and(|limit| now > limit));
    }

    match entry.headers.get(EXPIRES) {
        Some(expires) => Ok(parse_http_date(expires)? < now),
        None => Ok(true),
    }
}

/// Decides whether a fetched `200` response is stored.
pub trait CacheabilityPolicy: Send + Sync {
    fn is_cacheable(&self, response: &Response) -> bool;
}

/// Stores every `200` response.
///
/// `no-store` and `no-cache` are parsed by [`CacheControl`] but are
/// not consulted here; stricter policies plug in through
/// [`CacheabilityPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCacheable;

impl CacheabilityPolicy for AlwaysCacheable {
    fn is_cacheable(&self, _response: &Response) -> bool {
        true
    }
}

/// Cacheability under the default policy.
pub fn is_cacheable(response: &Response) -> bool {
    AlwaysCacheable.is_cacheable(response)
}
