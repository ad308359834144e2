//! Server-state caching.
//!
//! This module provides the `QueryCache` for keeping recently fetched API
//! payloads in memory. Entries are keyed by request path and considered
//! stale after a configurable window (5 minutes by default).
//!
//! The cache is cleared when the session expires or the user logs out, so no
//! authenticated data outlives the session.

pub mod manager;

pub use manager::{CachedData, QueryCache, DEFAULT_STALE_MINUTES};
