use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Event names as constants
pub mod event_names {
    /// Refresh failed; the session is gone
    pub const SESSION_EXPIRED: &str = "auth:session-expired";
}

/// Listener queue depth. One listener draining promptly needs very little.
pub const CHANNEL_CAPACITY: usize = 16;

/// Session-expired payload: where to send the user after cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExpired {
    pub redirect_to: String,
}

/// Publish/subscribe channel for session expiry.
///
/// Injected wherever it is needed rather than held globally. Dropping a
/// receiver unsubscribes it.
#[derive(Clone)]
pub struct SessionExpiryNotifier {
    sender: broadcast::Sender<SessionExpired>,
}

impl Default for SessionExpiryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionExpiryNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionExpired> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Fire-and-forget. Returns how many listeners received the signal.
    pub fn publish(&self, signal: SessionExpired) -> usize {
        match self.sender.send(signal) {
            Ok(count) => {
                info!(
                    event = event_names::SESSION_EXPIRED,
                    listeners = count,
                    "Session expiry published"
                );
                count
            }
            Err(broadcast::error::SendError(signal)) => {
                debug!(
                    event = event_names::SESSION_EXPIRED,
                    redirect_to = %signal.redirect_to,
                    "Session expiry published with no listeners"
                );
                0
            }
        }
    }
}
