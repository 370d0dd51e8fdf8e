//! HTTP response as returned by the transport and persisted in content files.

use crate::headers::Headers;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// A complete HTTP response.
///
/// This is both what the HTTP transport hands back and what a content file
/// stores for one cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub text: String,
    #[serde(rename = "header")]
    pub headers: Headers,
    pub url: String,
    /// Round-trip time of the fetch that produced it, persisted as seconds.
    #[serde(serialize_with = "serialize_secs", deserialize_with = "deserialize_secs")]
    pub elapsed: Duration,
}

impl Response {
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self { status, text: String::new(), headers: Headers::new(), url: url.into(), elapsed: Duration::ZERO }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

fn serialize_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

fn deserialize_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_persists_as_seconds() {
        let response = Response::new(200, "https://example.com/").with_elapsed(Duration::from_millis(1500));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["elapsed"], 1.5);
        assert_eq!(value["status"], 200);
    }

    #[test]
    fn test_negative_elapsed_rejected() {
        let json = r#"{"status":200,"text":"","header":{},"url":"u","elapsed":-1.0}"#;
        assert!(serde_json::from_str::<Response>(json).is_err());
    }

    #[test]
    fn test_status_helpers() {
        assert!(Response::new(200, "u").is_ok());
        assert!(Response::new(304, "u").is_not_modified());
        assert!(!Response::new(500, "u").is_ok());
    }
}
