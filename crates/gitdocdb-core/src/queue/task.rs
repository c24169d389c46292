//! The single-consumer FIFO task queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::CoreError;

use super::cancel::CancelToken;

enum RunMode<'a> {
    Execute(&'a CancelToken),
    Cancel,
}

struct Job {
    label: String,
    cancel: CancelToken,
    run: Box<dyn FnOnce(RunMode<'_>) + Send>,
}

/// A handle to a task submitted on the queue; `join` blocks for its result.
pub struct TaskHandle<T> {
    receiver: mpsc::Receiver<Result<T, CoreError>>,
    cancel: CancelToken,
}

impl<T> TaskHandle<T> {
    /// Block until the task completes, returning its result.
    ///
    /// # Errors
    /// Returns the task's own error, or [`CoreError::Closing`] if the queue
    /// was torn down before the task ran.
    pub fn join(self) -> Result<T, CoreError> {
        self.receiver.recv().unwrap_or(Err(CoreError::Closing))
    }

    /// Request cooperative cancellation of this task. Has no effect if the
    /// task has already completed; an in-flight task observes this at its
    /// next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

struct Drain {
    pending: Mutex<usize>,
    drained: Condvar,
}

/// A single-consumer FIFO queue of mutating operations for one database —
/// the only writer to its working tree.
pub struct TaskQueue {
    sender: Option<SyncSender<Job>>,
    closing: Arc<AtomicBool>,
    force_cancel: Arc<AtomicBool>,
    drain: Arc<Drain>,
    worker: Option<JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawn the background consumer thread.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::sync_channel::<Job>(1024);
        let closing = Arc::new(AtomicBool::new(false));
        let force_cancel = Arc::new(AtomicBool::new(false));
        let drain = Arc::new(Drain {
            pending: Mutex::new(0),
            drained: Condvar::new(),
        });

        let worker_force_cancel = Arc::clone(&force_cancel);
        let worker_drain = Arc::clone(&drain);
        let worker = std::thread::Builder::new()
            .name("gitdocdb-task-queue".into())
            .spawn(move || {
                for job in receiver {
                    let mode = if worker_force_cancel.load(Ordering::Acquire) {
                        RunMode::Cancel
                    } else {
                        RunMode::Execute(&job.cancel)
                    };
                    tracing::debug!(label = %job.label, "running queued task");
                    (job.run)(mode);

                    let mut pending = worker_drain.pending.lock().expect("drain mutex poisoned");
                    *pending -= 1;
                    if *pending == 0 {
                        worker_drain.drained.notify_all();
                    }
                }
            })
            .expect("failed to spawn task queue worker thread");

        Self {
            sender: Some(sender),
            closing,
            force_cancel,
            drain,
            worker: Some(worker),
        }
    }

    /// Submit a task. Ordering within the queue is strictly submission order.
    ///
    /// # Errors
    /// Returns [`CoreError::Closing`] if `close` has already been requested.
    pub fn submit<T>(
        &self,
        label: impl Into<String>,
        work: impl FnOnce(&CancelToken) -> Result<T, CoreError> + Send + 'static,
    ) -> Result<TaskHandle<T>, CoreError>
    where
        T: Send + 'static,
    {
        if self.closing.load(Ordering::Acquire) {
            return Err(CoreError::Closing);
        }
        let label = label.into();
        let cancel_for_job = CancelToken::new();
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let label_for_cancel = label.clone();
        let run: Box<dyn FnOnce(RunMode<'_>) + Send> = Box::new(move |mode| {
            let result = match mode {
                RunMode::Execute(cancel) => work(cancel),
                RunMode::Cancel => Err(CoreError::TaskCancel {
                    label: label_for_cancel,
                }),
            };
            let _ = reply_tx.send(result);
        });

        let mut pending = self.drain.pending.lock().expect("drain mutex poisoned");
        let sender = self.sender.as_ref().ok_or(CoreError::Closing)?;
        sender
            .send(Job {
                label,
                cancel: cancel_for_job.clone(),
                run,
            })
            .map_err(|_| CoreError::Closing)?;
        *pending += 1;

        Ok(TaskHandle {
            receiver: reply_rx,
            cancel: cancel_for_job,
        })
    }

    /// Refuse new submissions and wait up to `timeout` for the queue to
    /// drain. On expiry, either force-cancel every still-pending task or
    /// fail with [`CoreError::CloseTimeout`] while leaving the queue intact.
    ///
    /// # Errors
    /// Returns [`CoreError::CloseTimeout`] if `timeout` elapses with tasks
    /// still pending and `force` is `false`.
    pub fn close(&self, timeout: Duration, force: bool) -> Result<(), CoreError> {
        self.closing.store(true, Ordering::Release);

        let pending = self.drain.pending.lock().expect("drain mutex poisoned");
        let (pending, timed_out) = self
            .drain
            .drained
            .wait_timeout_while(pending, timeout, |p| *p > 0)
            .expect("drain condvar poisoned");

        if !timed_out.timed_out() || *pending == 0 {
            return Ok(());
        }
        drop(pending);

        if force {
            self.force_cancel.store(true, Ordering::Release);
            Ok(())
        } else {
            Err(CoreError::CloseTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    /// Number of tasks currently queued or in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        *self.drain.pending.lock().expect("drain mutex poisoned")
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.closing.store(true, Ordering::Release);
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Poll-free helper used by tests: wait for a predicate with a bounded
/// sleep loop rather than a fixed sleep.
#[cfg(test)]
fn wait_until(mut predicate: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    predicate()
}
