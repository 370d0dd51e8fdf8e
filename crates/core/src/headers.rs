//! Case-insensitive header map shared by requests, responses, and cache entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DATE: &str = "Date";
pub const EXPIRES: &str = "Expires";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const ETAG: &str = "ETag";
pub const LAST_MODIFIED: &str = "Last-Modified";
pub const USER_AGENT: &str = "User-Agent";
pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
pub const CONNECTION: &str = "Connection";

/// String-to-string header map.
///
/// Names compare ASCII case-insensitively; the spelling of the most recent
/// insert is the one kept and serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn stored_name(&self, name: &str) -> Option<&String> {
        self.0.keys().find(|k| k.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.stored_name(name)
            .and_then(|k| self.0.get(k))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stored_name(name).is_some()
    }

    /// Set `name`, replacing any existing value regardless of case.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let previous = self.remove(&name);
        self.0.insert(name, value.into());
        previous
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let stored = self.stored_name(name)?.clone();
        self.0.remove(&stored)
    }

    /// Merge `incoming` into this map.
    ///
    /// Incoming values win over same-named existing ones; names not present
    /// in `incoming` are left unchanged.
    pub fn merge(&mut self, incoming: Headers) {
        for (name, value) in incoming.0 {
            self.insert(name, value);
        }
    }

    /// Copy the named headers from `source` when present there.
    ///
    /// Names missing from `source` keep their current value.
    pub fn overlay(&mut self, source: &Headers, names: &[&str]) {
        for name in names {
            if let Some(value) = source.get(name) {
                self.insert(*name, value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Headers {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
