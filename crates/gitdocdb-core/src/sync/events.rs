//! The sync event channel.

use crate::error::CoreError;
use crate::model::SyncResult;

/// One lifecycle event emitted by a running or periodic sync.
///
/// Listeners are decoupled from task completion: they observe events in
/// commit order (ordering guarantee 3) regardless of when the
/// caller that triggered the sync gets its own result back.
#[derive(Clone, Debug)]
pub enum SyncEvent {
    /// About to start a periodic sync tick.
    BeforeLiveSync,
    /// A sync cycle has begun.
    Start,
    /// An intermediate progress note (fetch started, classifying, etc.).
    Progress(String),
    /// Document-level changes were applied to either side.
    Change(SyncResult),
    /// The live sync loop paused (e.g. after repeated auth failures).
    Pause,
    /// The live sync loop resumed after a pause.
    Resume,
    /// A sync cycle completed.
    Complete(SyncResult),
    /// A sync cycle failed.
    Error(String),
}

/// A listener invoked for every [`SyncEvent`].
pub type Listener = Box<dyn Fn(&SyncEvent) + Send + Sync>;

/// A simple fan-out list of listeners. Not a generic pub/sub bus: the sync
/// engine is the sole publisher, registered once per [`crate::sync::SyncEngine`].
#[derive(Default)]
pub struct EventChannel {
    listeners: Vec<Listener>,
}

impl EventChannel {
    /// A channel with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Order of registration is preserved for dispatch.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Dispatch an event to every listener, in registration order.
    pub fn emit(&self, event: &SyncEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Convert a sync-cycle failure into the freeform message carried by
/// [`SyncEvent::Error`].
#[must_use]
pub fn describe_error(error: &CoreError) -> String {
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn listeners_are_invoked_in_registration_order() {
        let mut channel = EventChannel::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            channel.subscribe(Box::new(move |_event| order.lock().unwrap().push(i)));
        }
        channel.emit(&SyncEvent::Start);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn emit_reaches_every_listener() {
        let mut channel = EventChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let count = Arc::clone(&count);
            channel.subscribe(Box::new(move |_event| {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }
        channel.emit(&SyncEvent::Complete(SyncResult::nop()));
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }
}
