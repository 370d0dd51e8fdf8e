//! Request identity used as the cache lookup key.
//!
//! Two requests address the same cached resource when their derived key
//! `url + parameters + User-Agent` is byte-equal. Every other header is
//! carried along for the transport but ignored for identity.

use crate::headers::{self, Headers};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Query parameters in their url-encoded form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    content: String,
}

impl Parameters {
    /// Wrap already-encoded parameter content, e.g. `a=1&b=2`.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }

    /// Encode key/value pairs as `application/x-www-form-urlencoded`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        Self { content: serializer.finish() }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A logical GET request: URL, headers, and query parameters.
///
/// Each `with_*` call replaces the whole field it names, so applying the
/// same kind twice keeps only the later value. Use [`Request::merge_headers`]
/// to layer headers on top of existing ones instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub url: String,
    #[serde(rename = "header")]
    pub headers: Headers,
    pub parameters: Parameters,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn merge_headers(&mut self, headers: Headers) -> &mut Self {
        self.headers.merge(headers);
        self
    }

    pub fn user_agent(&self) -> &str {
        self.headers.get(headers::USER_AGENT).unwrap_or("")
    }

    /// Derived comparison key: `url + parameters + User-Agent`.
    pub fn cache_key(&self) -> String {
        let user_agent = self.user_agent();
        let mut key = String::with_capacity(self.url.len() + self.parameters.content.len() + user_agent.len());
        key.push_str(&self.url);
        key.push_str(&self.parameters.content);
        key.push_str(user_agent);
        key
    }

    fn key_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.url
            .bytes()
            .chain(self.parameters.content.bytes())
            .chain(self.user_agent().bytes())
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.key_bytes().eq(other.key_bytes())
    }
}

impl Eq for Request {}

impl PartialOrd for Request {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Request {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_bytes().cmp(other.key_bytes())
    }
}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cache_key().hash(state);
    }
}
