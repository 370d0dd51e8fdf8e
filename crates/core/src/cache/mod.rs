//! Disk-backed HTTP response cache.
//!
//! This module provides the storage and freshness half of the cache:
//!
//! - A JSON index mapping request identity to entry metadata, loaded at open
//!   and written back at close
//! - One randomly named content file per cached response, read lazily
//! - Cache-Control / Expires freshness evaluation
//! - HTTP date parsing for the three legacy date grammars

pub mod entry;
pub mod freshness;
pub mod http_date;
pub mod index;
pub mod store;

pub use crate::Error;

pub use entry::{Body, CacheEntry};
pub use freshness::{AlwaysCacheable, CacheControl, CacheabilityPolicy, is_cacheable, is_stale, is_stale_at};
pub use http_date::{format_http_date, parse_http_date};
pub use index::{HttpCache, INDEX_FILE};
pub use store::ContentStore;
