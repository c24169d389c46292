//! The single-writer task queue.

mod cancel;
mod task;

pub use cancel::CancelToken;
pub use task::{TaskHandle, TaskQueue};
