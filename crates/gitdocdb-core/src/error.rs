//! Error types for the sync engine, document merger, and task queue.

use thiserror::Error;

use gitdocdb_git::GitError;

/// Errors produced by `gitdocdb-core`'s merge, sync, and queue subsystems.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document body was not valid JSON.
    #[error("invalid JSON in `{path}`: {message}")]
    InvalidJson {
        /// The document path.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A document's `_id` was malformed or didn't match its filename.
    #[error("invalid document id `{id}`: {reason}")]
    InvalidId {
        /// The offending id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// `get` was called for a document that does not exist.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// The requested id.
        id: String,
    },

    /// The working-tree projector could not create a parent directory.
    #[error("cannot create directory `{path}`: {message}")]
    CannotCreateDirectory {
        /// The directory path.
        path: String,
        /// Underlying I/O message.
        message: String,
    },

    /// Removing a file raced with another process past the configured timeout.
    #[error("timed out removing `{path}` after {timeout_secs}s")]
    FileRemoveTimeout {
        /// The path that could not be removed.
        path: String,
        /// The configured timeout.
        timeout_secs: u64,
    },

    /// A sync had no common ancestor and no `behaviorForNoMergeBase` policy
    /// resolved it.
    #[error("no merge base found between local and remote history")]
    NoMergeBaseFound,

    /// A sync was requested while one was already in flight for this database.
    #[error("a sync is already running for this database")]
    SyncAlreadyRunning,

    /// The task queue has received a close request; no new tasks are accepted.
    #[error("database is closing; no new operations are accepted")]
    Closing,

    /// `close` did not drain the queue before its timeout elapsed.
    #[error("close timed out after {timeout_ms}ms with tasks still queued")]
    CloseTimeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// A task was canceled before or during execution.
    #[error("task `{label}` was canceled")]
    TaskCancel {
        /// The label of the canceled task.
        label: String,
    },

    /// The underlying git object gateway returned an error.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl CoreError {
    /// Whether the retry layer should retry an operation that
    /// failed with this error. Delegates to the wrapped [`GitError`] when
    /// applicable; every other kind is a local, deterministic failure that
    /// retrying cannot fix.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Git(e) => e.is_retryable(),
            _ => false,
        }
    }
}
