//! Session refresh coordination.
//!
//! With single-flight enabled, callers that observed the same refresh
//! generation before their request went out share one refresh call: the
//! first to arrive performs it while holding the gate, later arrivals see the
//! bumped generation and reuse its outcome.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

/// Outcome of a refresh attempt as seen by one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// `performed` is true only for the caller that actually issued the call
    Failed { performed: bool },
}

#[derive(Debug)]
pub struct RefreshGate {
    single_flight: bool,
    generation: AtomicU64,
    /// Result of the most recent refresh, guarded so only one runs at a time
    last_succeeded: Mutex<bool>,
}

impl RefreshGate {
    pub fn new(single_flight: bool) -> Self {
        Self {
            single_flight,
            generation: AtomicU64::new(0),
            last_succeeded: Mutex::new(false),
        }
    }

    /// Snapshot taken before a request is dispatched.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Run `refresh` unless a refresh already completed after `observed`.
    pub async fn run<F, Fut>(&self, observed: u64, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if !self.single_flight {
            let succeeded = refresh().await;
            self.generation.fetch_add(1, Ordering::AcqRel);
            return Self::outcome(succeeded, true);
        }

        let mut last_succeeded = self.last_succeeded.lock().await;
        if self.generation() != observed {
            debug!(observed, current = self.generation(), "Reusing completed refresh");
            return Self::outcome(*last_succeeded, false);
        }

        let succeeded = refresh().await;
        *last_succeeded = succeeded;
        self.generation.fetch_add(1, Ordering::AcqRel);
        Self::outcome(succeeded, true)
    }

    fn outcome(succeeded: bool, performed: bool) -> RefreshOutcome {
        if succeeded {
            RefreshOutcome::Refreshed
        } else {
            RefreshOutcome::Failed { performed }
        }
    }
}
