//! # mdstamp-vault
//!
//! The vault side of mdstamp: a file-system document store, a watcher that
//! turns file system events into create/modify notifications, and the
//! handler that runs each notification through the decision engine in
//! [`mdstamp_core`].

pub mod handler;
pub mod notifier;
pub mod outcome;
pub mod scan;
pub mod service;
pub mod store;
pub mod watcher;

pub use handler::Handler;
pub use notifier::{LogNotifier, MemoryNotifier, Notifier};
pub use outcome::{Outcome, Report, Summary};
pub use scan::scan_vault;
pub use service::Service;
pub use store::{DocumentRef, DocumentStore, FsStore};
pub use watcher::{ChangeEvent, ChangeKind, Subscription, VaultWatcher};
