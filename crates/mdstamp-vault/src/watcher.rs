//! File system watcher delivering create/modify notifications.
//!
//! Uses the `notify` crate for cross-platform file system events
//! (FSEvents on macOS, inotify on Linux, ReadDirectoryChanges on Windows).
//! Events of a kind are only delivered while a [`Subscription`] for that
//! kind is held.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use mdstamp_core::error::StampError;

/// Kind of change a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Modify,
}

/// A create or modify notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
struct Listeners {
    create: AtomicUsize,
    modify: AtomicUsize,
}

impl Listeners {
    fn counter(&self, kind: ChangeKind) -> &AtomicUsize {
        match kind {
            ChangeKind::Create => &self.create,
            ChangeKind::Modify => &self.modify,
        }
    }

    fn is_listening(&self, kind: ChangeKind) -> bool {
        self.counter(kind).load(Ordering::SeqCst) > 0
    }
}

/// Handle for an active subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    kind: ChangeKind,
    listeners: Arc<Listeners>,
    released: bool,
}

impl Subscription {
    /// Unsubscribe now.
    pub fn release(mut self) {
        self.unsubscribe();
    }

    fn unsubscribe(&mut self) {
        if !self.released {
            self.listeners
                .counter(self.kind)
                .fetch_sub(1, Ordering::SeqCst);
            self.released = true;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Create),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modify),
        _ => None,
    }
}

/// Watches a vault directory for changes and emits events.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<ChangeEvent>,
    listeners: Arc<Listeners>,
}

impl VaultWatcher {
    /// Start watching a vault directory recursively.
    ///
    /// No events are delivered until something subscribes.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::Watch`] if the watcher cannot be created.
    pub fn start(vault_root: &Path) -> Result<Self, StampError> {
        let (tx, rx) = mpsc::channel();
        let listeners = Arc::new(Listeners::default());
        let callback_listeners = Arc::clone(&listeners);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "watcher error");
                    return;
                }
            };
            let Some(kind) = change_kind(&event.kind) else {
                return;
            };
            if !callback_listeners.is_listening(kind) {
                return;
            }
            for path in event.paths {
                let _ = tx.send(ChangeEvent { kind, path });
            }
        })
        .map_err(|e| StampError::Watch(e.to_string()))?;

        watcher
            .watch(vault_root, RecursiveMode::Recursive)
            .map_err(|e| StampError::Watch(format!("{}: {e}", vault_root.display())))?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            listeners,
        })
    }

    /// Start receiving events of `kind` for as long as the handle lives.
    #[must_use]
    pub fn subscribe(&self, kind: ChangeKind) -> Subscription {
        self.listeners.counter(kind).fetch_add(1, Ordering::SeqCst);
        Subscription {
            kind,
            listeners: Arc::clone(&self.listeners),
            released: false,
        }
    }

    /// Number of live subscriptions of `kind`.
    #[must_use]
    pub fn subscribers(&self, kind: ChangeKind) -> usize {
        self.listeners.counter(kind).load(Ordering::SeqCst)
    }

    /// Try to receive the next event with a timeout.
    ///
    /// Returns `None` if no event is available within the timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }
}
