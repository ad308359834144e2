//! HTTP plumbing for the quiz platform API.
//!
//! This module provides:
//! - `PendingRequest`: a replayable description of one HTTP call
//! - `Dispatcher`: sends a request with the session cookie and JSON headers
//! - `ApiError`: the tagged failure type every caller branches on
//! - `AdminApi`: typed CRUD endpoints for the admin resources
//!
//! Authentication is cookie based; no bearer token is ever attached.

pub mod admin;
pub mod dispatcher;
pub mod error;
pub mod request;

pub use admin::{AdminApi, Resource};
pub use dispatcher::Dispatcher;
pub use error::{ApiError, ApiResult};
pub use request::PendingRequest;
