//! Shell-side reaction to session expiry.
//!
//! The shell mounts one `ExpiryListener` at startup. For every
//! `SessionExpired` signal it first clears server-derived state (query cache
//! and current user), then navigates to the signal's redirect path. The
//! listener is torn down on `unmount` or drop.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::SessionStore;
use crate::cache::QueryCache;
use crate::events::{SessionExpired, SessionExpiryNotifier};
use crate::navigation::Router;

pub struct ExpiryListener {
    handle: Option<JoinHandle<()>>,
}

impl ExpiryListener {
    /// Subscribe to `notifier` and start reacting to expiry signals.
    pub fn mount(
        notifier: &SessionExpiryNotifier,
        session: SessionStore,
        cache: QueryCache,
        router: Router,
    ) -> Self {
        let mut rx = notifier.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(signal) => handle_expiry(&signal, &session, &cache, &router).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Expiry listener lagged, skipping to latest signal");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Expiry listener stopped");
        });
        debug!("Expiry listener mounted");

        Self {
            handle: Some(handle),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn unmount(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Expiry listener unmounted");
        }
    }
}

impl Drop for ExpiryListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clear server-derived state, then move to the login route.
async fn handle_expiry(
    signal: &SessionExpired,
    session: &SessionStore,
    cache: &QueryCache,
    router: &Router,
) {
    cache.clear().await;
    session.clear();
    router.navigate(&signal.redirect_to);
    info!(redirect_to = %signal.redirect_to, "Session expired, redirected to login");
}
