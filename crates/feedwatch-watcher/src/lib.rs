//! Feedwatch Watcher — the long-lived subscription loop for one collection.
//!
//! A watcher opens the collection's change feed from its stored checkpoint,
//! hands every event to its handler in feed order, advances the checkpoint
//! after each event and reconnects after a fixed backoff whenever the feed
//! fails. It only stops when shutdown is signalled.

pub mod watcher;

pub use watcher::{StreamWatcher, WatcherSettings};
