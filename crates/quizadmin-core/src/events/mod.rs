//! In-process application events.
//!
//! Currently carries the session-expiry signal published by the
//! reauthentication wrapper and consumed by the shell.

pub mod notifier;

pub use notifier::{event_names, SessionExpired, SessionExpiryNotifier, CHANNEL_CAPACITY};
