//! Authentication and session management.
//!
//! This module provides:
//! - `AuthenticatedClient`: the dispatcher wrapped with refresh-and-retry
//! - `AuthService`: login, register, logout and the "who am I" probe
//! - `SessionStore` / `CurrentUser`: the client-side view of the session
//! - `CredentialStore`: optional remembered passwords via the OS keychain
//!
//! The session itself is an HTTP cookie managed by the client's cookie store.

pub mod credentials;
pub mod endpoints;
pub mod reauth;
pub mod refresh;
pub mod service;
pub mod session;

pub use credentials::CredentialStore;
pub use reauth::AuthenticatedClient;
pub use service::{AuthService, LoginRequest, RegisterRequest};
pub use session::{CurrentUser, SessionStore};
