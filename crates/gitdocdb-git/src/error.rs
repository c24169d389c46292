//! Error types for git object gateway operations.
//!
//! [`GitError`] is the single error type returned by all [`GitRepo`](crate::GitRepo)
//! trait methods. It uses rich enum variants so callers can match on specific
//! failure modes — in particular so the retry layer (gitdocdb-core) can decide
//! retry-or-not from the variant alone, without parsing error messages.

use thiserror::Error;

/// Errors returned by [`GitRepo`](crate::GitRepo) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A requested object or ref was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// An OID string could not be parsed or was otherwise invalid.
    #[error("invalid OID `{value}`: {reason}")]
    InvalidOid {
        /// The raw value that failed validation.
        value: String,
        /// Why validation failed.
        reason: String,
    },

    /// An I/O error occurred (file system, process spawn, etc.).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A merge-base could not be found between two histories with no common ancestor.
    #[error("no merge base between {a} and {b}")]
    NoMergeBaseFound {
        /// One side of the attempted merge-base.
        a: String,
        /// The other side.
        b: String,
    },

    /// The remote URL is not an accepted form (only `https://` is accepted).
    #[error("invalid remote URL `{url}`: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A remote URL used a non-HTTPS scheme where HTTPS is required.
    #[error("remote `{url}` must use https")]
    HttpProtocolRequired {
        /// The offending URL.
        url: String,
    },

    /// A generic network failure (DNS, connection reset, etc.). Retryable.
    #[error("network error contacting `{remote}`: {message}")]
    HttpNetwork {
        /// The remote being contacted.
        remote: String,
        /// Underlying failure description.
        message: String,
    },

    /// The overall request timed out. Retryable.
    #[error("request to `{remote}` timed out after {elapsed_secs}s")]
    RequestTimeout {
        /// The remote being contacted.
        remote: String,
        /// How long the request ran before timing out.
        elapsed_secs: u64,
    },

    /// The socket went idle past the configured socket-idle timeout. Retryable.
    #[error("socket to `{remote}` timed out")]
    SocketTimeout {
        /// The remote being contacted.
        remote: String,
    },

    /// Could not establish a connection at all. Retryable.
    #[error("cannot connect to `{remote}`: {message}")]
    CannotConnect {
        /// The remote being contacted.
        remote: String,
        /// Underlying failure description.
        message: String,
    },

    /// A personal access token was required but not supplied.
    #[error("undefined personal access token for `{remote}`")]
    UndefinedPersonalAccessToken {
        /// The remote requiring authentication.
        remote: String,
    },

    /// Fetch was refused for lack of read permission. Not retryable.
    #[error("fetch permission denied for `{remote}`")]
    FetchPermissionDenied {
        /// The remote that refused the read.
        remote: String,
    },

    /// Push was refused for lack of write permission. Not retryable.
    #[error("push permission denied for `{remote}`")]
    PushPermissionDenied {
        /// The remote that refused the write.
        remote: String,
    },

    /// The connection dropped mid-push. Retryable (network-shaped).
    #[error("push to `{remote}` lost connection: {message}")]
    PushConnectionFailed {
        /// The remote being pushed to.
        remote: String,
        /// Underlying failure description.
        message: String,
    },

    /// The push was rejected because the remote ref moved (non-fast-forward).
    /// Not retryable by the retry layer; the caller should re-sync first.
    #[error("push to `{remote}` rejected: non-fast-forward on `{branch}`")]
    NonFastForward {
        /// The remote being pushed to.
        remote: String,
        /// The branch that moved out from under the push.
        branch: String,
    },

    /// The named remote repository does not exist (HTTP 404). Not retryable.
    #[error("remote repository not found: `{remote}`")]
    RemoteRepositoryNotFound {
        /// The remote URL.
        remote: String,
    },

    /// A merge operation produced unresolved conflicts.
    #[error("merge conflict: {message}")]
    MergeConflict {
        /// Description of the conflict.
        message: String,
    },

    /// The underlying git backend (gix, CLI subprocess) returned an
    /// unclassified error. Catch-all for errors that don't fit other variants.
    #[error("git backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}

impl GitError {
    /// Whether the retry layer should retry an operation that failed with
    /// this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpNetwork { .. }
                | Self::RequestTimeout { .. }
                | Self::SocketTimeout { .. }
                | Self::CannotConnect { .. }
                | Self::PushConnectionFailed { .. }
        )
    }
}
