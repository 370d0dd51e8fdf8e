//! Client side of httpcache.
//!
//! This crate provides the HTTP transport, the conditional revalidation
//! protocol, and the cache-aware [`get`] that ties them to
//! [`httpcache_core::HttpCache`].

pub mod get;
pub mod revalidate;
pub mod transport;

#[cfg(test)]
mod testing;

pub use get::{get, get_with_policy};
pub use revalidate::{Revalidated, validation_request};
pub use transport::{ReqwestTransport, Transport, TransportConfig};
