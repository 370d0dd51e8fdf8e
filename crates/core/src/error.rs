//! Unified error types for httpcache.
//!
//! Display strings carry a stable upper-case prefix so callers can match
//! on the failure class without depending on variant layout.

use std::io;
use std::path::{Path, PathBuf};

/// Unified error type for cache, freshness, and transport failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cache path exists but cannot be used as a cache directory.
    #[error("CONFIG_ERROR: {0}")]
    Configuration(String),

    /// An HTTP date matched none of the accepted grammars.
    #[error("PARSE_ERROR: unrecognized HTTP date '{0}'")]
    Parse(String),

    /// Opaque failure reported by the HTTP transport.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// File I/O on the index or a content file failed.
    #[error("STORAGE_ERROR: {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Index or content file exists but cannot be decoded.
    #[error("CORRUPT_FILE: {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Encoding an index or content file failed.
    #[error("STORAGE_ERROR: failed to encode {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Wrap an I/O error together with the path it happened on.
    pub fn storage(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Storage { path: path.as_ref().to_path_buf(), source }
    }
}
