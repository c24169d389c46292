//! The database-facing error type.
//!
//! Defines [`GitDocDbError`], the unified error surface returned by
//! [`crate::Database`] operations. Error messages are agent-friendly: each
//! variant describes what went wrong and how to fix it, mirroring
//! `ManifoldError`'s style. No `gix`/object-database vocabulary leaks into
//! variants that don't need it — callers see database-level error kinds
//! instead.

use std::fmt;
use std::path::PathBuf;

use gitdocdb_core::CoreError;
use gitdocdb_git::GitError;

// ---------------------------------------------------------------------------
// GitDocDbError
// ---------------------------------------------------------------------------

/// Unified error type for database operations.
///
/// Each variant is designed to be self-contained: a caller receiving this
/// error should be able to understand what happened and what to do next
/// without additional context.
#[derive(Debug)]
pub enum GitDocDbError {
    /// A document body was not valid JSON (or YAML/front-matter, per
    /// the configured serialization mode).
    InvalidJson {
        /// The document path.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A document's `_id` was malformed.
    InvalidId {
        /// The offending id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// `get` was called for a document that does not exist.
    DocumentNotFound {
        /// The requested id.
        id: String,
    },

    /// The remote URL was not an accepted form.
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A network operation failed after exhausting its retry budget.
    NetworkFailure {
        /// The remote being contacted.
        remote: String,
        /// The underlying failure.
        message: String,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// Authentication was refused by the remote.
    PermissionDenied {
        /// The remote that refused the operation.
        remote: String,
    },

    /// A sync found no common ancestor and no policy resolved it.
    NoMergeBaseFound,

    /// A sync was requested while one was already running for this database.
    SyncAlreadyRunning,

    /// `close` did not drain the task queue before its timeout elapsed.
    CloseTimeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// An operation was submitted to, or canceled by, a closing database.
    Closing,

    /// A queued task was canceled before or during execution.
    TaskCanceled {
        /// The label of the canceled task.
        label: String,
    },

    /// This path is already open in another `Database` handle in this process.
    AlreadyOpen {
        /// The canonical path already registered.
        path: PathBuf,
    },

    /// The configuration file could not be loaded or parsed.
    ConfigError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An I/O error occurred outside of the git object database (e.g.
    /// creating the local directory).
    Io(std::io::Error),
}

impl GitDocDbError {
    fn from_git_error(err: GitError) -> Self {
        match err {
            GitError::InvalidUrl { url, reason } => Self::InvalidUrl { url, reason },
            GitError::HttpProtocolRequired { url } => Self::InvalidUrl {
                url,
                reason: "only https:// remotes are accepted".to_owned(),
            },
            GitError::FetchPermissionDenied { remote } | GitError::PushPermissionDenied { remote } => {
                Self::PermissionDenied { remote }
            }
            GitError::UndefinedPersonalAccessToken { remote } => Self::PermissionDenied { remote },
            GitError::RemoteRepositoryNotFound { remote } => Self::NetworkFailure {
                remote,
                message: "remote repository not found".to_owned(),
                attempts: 1,
            },
            GitError::HttpNetwork { remote, message }
            | GitError::CannotConnect { remote, message }
            | GitError::PushConnectionFailed { remote, message } => Self::NetworkFailure {
                remote,
                message,
                attempts: 1,
            },
            GitError::RequestTimeout { remote, elapsed_secs } => Self::NetworkFailure {
                remote,
                message: format!("timed out after {elapsed_secs}s"),
                attempts: 1,
            },
            GitError::SocketTimeout { remote } => Self::NetworkFailure {
                remote,
                message: "socket idle timeout".to_owned(),
                attempts: 1,
            },
            other => Self::ConfigError {
                path: PathBuf::new(),
                detail: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Display — agent-friendly error messages
// ---------------------------------------------------------------------------

impl fmt::Display for GitDocDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { path, message } => {
                write!(
                    f,
                    "'{path}' does not contain valid content for its serialization mode: {message}\n  To fix: correct the file's contents, or re-`put` the document from a known-good value."
                )
            }
            Self::InvalidId { id, reason } => {
                write!(
                    f,
                    "invalid document id '{id}': {reason}\n  Ids must be non-empty and must not contain leading, trailing, or doubled '/'."
                )
            }
            Self::DocumentNotFound { id } => {
                write!(
                    f,
                    "document '{id}' not found.\n  To fix: check the id, or call `put` to create it first."
                )
            }
            Self::InvalidUrl { url, reason } => {
                write!(
                    f,
                    "invalid remote url '{url}': {reason}\n  Only https:// remotes are accepted; ssh/git:// URLs must go through the `ssh` connection kind instead."
                )
            }
            Self::NetworkFailure { remote, message, attempts } => {
                write!(
                    f,
                    "could not reach '{remote}' after {attempts} attempt(s): {message}\n  To fix: check connectivity and retry `sync`, or increase `network_retry`/`network_timeout_ms`."
                )
            }
            Self::PermissionDenied { remote } => {
                write!(
                    f,
                    "authentication to '{remote}' was refused.\n  To fix: check the configured personal access token or SSH key pair."
                )
            }
            Self::NoMergeBaseFound => {
                write!(
                    f,
                    "local and remote history share no common ancestor.\n  To fix: set `combine_db_strategy` to \"combine-head-with-theirs\" to bootstrap, or \"nop\" to skip this sync."
                )
            }
            Self::SyncAlreadyRunning => {
                write!(
                    f,
                    "a sync is already running for this database.\n  To fix: wait for it to complete, or check the event channel for its result."
                )
            }
            Self::CloseTimeout { timeout_ms } => {
                write!(
                    f,
                    "close timed out after {timeout_ms}ms with tasks still queued.\n  To fix: call close again with `force: true`, or a longer timeout."
                )
            }
            Self::Closing => {
                write!(
                    f,
                    "this database is closing; no new operations are accepted.\n  To fix: open a fresh `Database` handle once close completes."
                )
            }
            Self::TaskCanceled { label } => {
                write!(f, "task '{label}' was canceled before completion.")
            }
            Self::AlreadyOpen { path } => {
                write!(
                    f,
                    "'{}' is already open in this process.\n  To fix: reuse the existing handle instead of opening a second one.",
                    path.display()
                )
            }
            Self::ConfigError { path, detail } => {
                if path.as_os_str().is_empty() {
                    write!(f, "configuration error: {detail}")
                } else {
                    write!(
                        f,
                        "configuration error in '{}': {detail}\n  To fix: edit the config file and correct the issue.",
                        path.display()
                    )
                }
            }
            Self::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}\n  To fix: check file permissions and disk space."
                )
            }
        }
    }
}

impl std::error::Error for GitDocDbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<std::io::Error> for GitDocDbError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<crate::config::ConfigError> for GitDocDbError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::ConfigError {
            path: err.path.unwrap_or_default(),
            detail: err.message,
        }
    }
}

impl From<GitError> for GitDocDbError {
    fn from(err: GitError) -> Self {
        Self::from_git_error(err)
    }
}

impl From<CoreError> for GitDocDbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidJson { path, message } => Self::InvalidJson { path, message },
            CoreError::InvalidId { id, reason } => Self::InvalidId { id, reason },
            CoreError::DocumentNotFound { id } => Self::DocumentNotFound { id },
            CoreError::NoMergeBaseFound => Self::NoMergeBaseFound,
            CoreError::SyncAlreadyRunning => Self::SyncAlreadyRunning,
            CoreError::Closing => Self::Closing,
            CoreError::CloseTimeout { timeout_ms } => Self::CloseTimeout { timeout_ms },
            CoreError::TaskCancel { label } => Self::TaskCanceled { label },
            CoreError::Git(git_err) => Self::from_git_error(git_err),
            CoreError::CannotCreateDirectory { path, message } => Self::ConfigError {
                path: PathBuf::from(path),
                detail: message,
            },
            CoreError::FileRemoveTimeout { path, timeout_secs } => Self::ConfigError {
                path: PathBuf::from(path),
                detail: format!("timed out removing after {timeout_secs}s"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_document_not_found() {
        let err = GitDocDbError::DocumentNotFound { id: "nara".to_owned() };
        let msg = format!("{err}");
        assert!(msg.contains("nara"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn display_invalid_url() {
        let err = GitDocDbError::InvalidUrl {
            url: "git@host:repo.git".to_owned(),
            reason: "not https".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("git@host:repo.git"));
        assert!(msg.contains("https"));
    }

    #[test]
    fn display_no_merge_base() {
        let msg = format!("{}", GitDocDbError::NoMergeBaseFound);
        assert!(msg.contains("combine-head-with-theirs"));
    }

    #[test]
    fn display_close_timeout() {
        let msg = format!("{}", GitDocDbError::CloseTimeout { timeout_ms: 1 });
        assert!(msg.contains("1ms"));
        assert!(msg.contains("force"));
    }

    #[test]
    fn display_already_open() {
        let err = GitDocDbError::AlreadyOpen {
            path: PathBuf::from("/repo/notes"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("/repo/notes"));
        assert!(msg.contains("already open"));
    }

    #[test]
    fn error_source_io() {
        let err = GitDocDbError::Io(std::io::Error::other("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_source_non_io_is_none() {
        let err = GitDocDbError::NoMergeBaseFound;
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn from_core_error_document_not_found() {
        let core_err = CoreError::DocumentNotFound { id: "x".to_owned() };
        let err: GitDocDbError = core_err.into();
        assert!(matches!(err, GitDocDbError::DocumentNotFound { id } if id == "x"));
    }

    #[test]
    fn from_git_error_fetch_permission_denied() {
        let git_err = GitError::FetchPermissionDenied {
            remote: "https://example.com/r.git".to_owned(),
        };
        let err: GitDocDbError = git_err.into();
        assert!(matches!(err, GitDocDbError::PermissionDenied { .. }));
    }

    #[test]
    fn from_git_error_network_retryable_kinds() {
        let git_err = GitError::CannotConnect {
            remote: "https://example.com".to_owned(),
            message: "refused".to_owned(),
        };
        let err: GitDocDbError = git_err.into();
        assert!(matches!(err, GitDocDbError::NetworkFailure { .. }));
    }

    #[test]
    fn from_config_error() {
        let cfg_err = crate::config::ConfigError {
            path: Some(PathBuf::from("/repo/gitdocdb.toml")),
            message: "bad syntax".to_owned(),
        };
        let err: GitDocDbError = cfg_err.into();
        match err {
            GitDocDbError::ConfigError { path, detail } => {
                assert_eq!(path, PathBuf::from("/repo/gitdocdb.toml"));
                assert_eq!(detail, "bad syntax");
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
