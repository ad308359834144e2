//! Core library for the quiz platform administration console.
//!
//! The heart of the crate is the authenticated request pipeline:
//!
//! - [`api::Dispatcher`] issues JSON requests with the session cookie attached
//! - [`auth::AuthenticatedClient`] wraps the dispatcher with the
//!   refresh-and-retry state machine for expired sessions
//! - [`events::SessionExpiryNotifier`] broadcasts when a refresh fails, so the
//!   shell can clear cached state and navigate to login
//!
//! Around it sit the session store, the client-side router, the query cache,
//! and typed resource APIs for quizzes, questions, users, roles and analytics.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod events;
pub mod models;
pub mod navigation;
pub mod shell;

pub use api::{AdminApi, ApiError, ApiResult, Dispatcher, PendingRequest};
pub use auth::{AuthService, AuthenticatedClient, CurrentUser, SessionStore};
pub use cache::QueryCache;
pub use config::Config;
pub use events::{SessionExpired, SessionExpiryNotifier};
pub use navigation::Router;
pub use shell::ExpiryListener;
