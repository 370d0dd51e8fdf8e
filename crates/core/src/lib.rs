//! Core types and shared functionality for httpcache.
//!
//! This crate provides:
//! - Disk-backed cache index and content store
//! - Freshness evaluation and HTTP date parsing
//! - Request identity and response types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;

pub use cache::{CacheEntry, HttpCache};
pub use config::AppConfig;
pub use error::Error;
pub use headers::Headers;
pub use request::{Parameters, Request};
pub use response::Response;
