//! Ties the watcher to the handler for the lifetime of a watch session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use mdstamp_core::error::StampError;

use crate::handler::Handler;
use crate::notifier::Notifier;
use crate::outcome::{Outcome, Summary};
use crate::scan::scan_vault;
use crate::store::DocumentStore;
use crate::watcher::{ChangeEvent, ChangeKind, Subscription, VaultWatcher};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Owns the watcher, its subscriptions and the handler.
///
/// Events are handled one at a time in arrival order. Every subscription
/// taken in [`Service::start`] is released by [`Service::shutdown`], or on
/// drop.
pub struct Service<S, N> {
    handler: Handler<S, N>,
    watcher: VaultWatcher,
    subscriptions: Vec<Subscription>,
}

impl<S: DocumentStore, N: Notifier> Service<S, N> {
    /// Watch the handler's vault and subscribe to create and modify events.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Watch`] if the vault cannot be watched.
    pub fn start(handler: Handler<S, N>) -> Result<Self, StampError> {
        let watcher = VaultWatcher::start(handler.store().root())?;
        let subscriptions = vec![
            watcher.subscribe(ChangeKind::Create),
            watcher.subscribe(ChangeKind::Modify),
        ];
        info!(vault = %handler.store().root().display(), "watching vault");
        Ok(Self {
            handler,
            watcher,
            subscriptions,
        })
    }

    #[must_use]
    pub fn handler(&self) -> &Handler<S, N> {
        &self.handler
    }

    /// Number of subscriptions currently held.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handle every eligible document once, as if each had just changed.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Io`] if the vault cannot be walked.
    pub fn initial_scan(&self) -> Result<Summary, StampError> {
        let mut summary = Summary::default();
        for path in scan_vault(self.handler.store().root(), self.handler.filter())? {
            summary.record(&self.handler.handle_path(&path));
        }
        info!(
            written = summary.written,
            ignored = summary.ignored,
            errors = summary.errors,
            "initial scan finished"
        );
        Ok(summary)
    }

    /// Wait up to `timeout` for the next event and handle it.
    pub fn process_next(&self, timeout: Duration) -> Option<(ChangeEvent, Outcome)> {
        let event = self.watcher.recv_timeout(timeout)?;
        let outcome = self.handler.handle_path(&event.path);
        debug!(kind = ?event.kind, path = %event.path.display(), %outcome, "handled event");
        Some((event, outcome))
    }

    /// Handle events until `stop` is set.
    pub fn run(&self, stop: &AtomicBool) -> Summary {
        let mut summary = Summary::default();
        while !stop.load(Ordering::SeqCst) {
            if let Some((_, outcome)) = self.process_next(POLL_INTERVAL) {
                summary.record(&outcome);
            }
        }
        summary
    }
}

impl<S, N> Service<S, N> {
    /// Release every subscription and stop watching.
    pub fn shutdown(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        let count = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            subscription.release();
        }
        if count > 0 {
            info!(released = count, "unsubscribed from vault events");
        }
    }
}

impl<S, N> Drop for Service<S, N> {
    fn drop(&mut self) {
        self.release_all();
    }
}
