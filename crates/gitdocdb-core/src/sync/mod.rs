//! The sync engine, its event channel, and the retry layer wrapping
//! network operations.

pub mod engine;
pub mod events;
pub mod retry;

pub use engine::{sync_once, NoMergeBaseBehavior, SyncConfig};
pub use events::{EventChannel, Listener, SyncEvent};
pub use retry::{with_retry, RetryExhausted, RetryPolicy};
