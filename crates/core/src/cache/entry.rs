//! Cache entry metadata and lazily loaded response body.
//!
//! An entry keeps only the freshness/validator headers in memory and in the
//! index file. The full response lives in a content file and is read on
//! first access.

use super::store::ContentStore;
use crate::Error;
use crate::headers::{CACHE_CONTROL, DATE, ETAG, EXPIRES, Headers, LAST_MODIFIED};
use crate::response::Response;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Headers retained in an entry's snapshot.
pub const SNAPSHOT_HEADERS: [&str; 5] = [DATE, EXPIRES, CACHE_CONTROL, ETAG, LAST_MODIFIED];

/// Snapshot headers copied onto the served response and refreshed by a 304.
pub const OVERLAY_HEADERS: [&str; 4] = [DATE, EXPIRES, CACHE_CONTROL, ETAG];

/// Load state of an entry's response body.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// Known only through the index; the content file has not been read yet.
    #[default]
    Unloaded,
    Loaded(Response),
}

impl Body {
    /// The response, reading it from `path` if it is not loaded yet.
    fn load(&mut self, path: &Path) -> Result<&mut Response, Error> {
        match self {
            Body::Loaded(response) => Ok(response),
            Body::Unloaded => {
                *self = Body::Loaded(ContentStore::read(path)?);
                tracing::debug!("loaded cached body from {}", path.display());
                self.load(path)
            }
        }
    }
}

/// A cached response as tracked by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Seconds since the epoch of the store or the last successful revalidation.
    pub timestamp: i64,
    /// Freshness/validator subset of the response headers.
    #[serde(rename = "header")]
    pub headers: Headers,
    /// Content file owned by this entry.
    pub path: PathBuf,
    #[serde(skip)]
    body: Body,
    /// Refreshed since the index was last flushed.
    #[serde(skip)]
    modified: bool,
}

impl CacheEntry {
    pub(crate) fn new(response: Response, path: PathBuf, timestamp: i64) -> Self {
        Self {
            timestamp,
            headers: snapshot_headers(&response.headers),
            path,
            body: Body::Loaded(response),
            modified: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.body, Body::Loaded(_))
    }

    /// The full cached response.
    ///
    /// Reads the content file on first call only. The snapshot headers are
    /// copied over the response on every call, since a 304 updates the
    /// snapshot without rewriting the content file.
    pub fn response(&mut self) -> Result<&Response, Error> {
        let response = self.body.load(&self.path)?;
        response.headers.overlay(&self.headers, &OVERLAY_HEADERS);
        Ok(response)
    }

    /// Apply a `304 Not Modified` outcome.
    ///
    /// The timestamp moves to `now` (never backwards) and validation headers
    /// present in `validation` replace their snapshot counterparts.
    pub fn refresh(&mut self, now: i64, validation: &Headers) {
        self.timestamp = self.timestamp.max(now);
        self.headers.overlay(validation, &OVERLAY_HEADERS);
        self.modified = true;
    }

    pub(crate) fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_flushed(&mut self) {
        self.modified = false;
    }
}

/// Keep only the freshness/validator headers of `headers`.
pub fn snapshot_headers(headers: &Headers) -> Headers {
    SNAPSHOT_HEADERS
        .iter()
        .filter_map(|name| headers.get(name).map(|value| (*name, value)))
        .collect()
}
