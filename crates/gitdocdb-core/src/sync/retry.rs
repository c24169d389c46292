//! The retry layer wrapping fetch and push.

use std::time::Duration;

use crate::error::CoreError;
use crate::queue::CancelToken;

/// Retry policy for network operations, driven by the
/// `networkRetry`/`networkRetryInterval` configuration options.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(2),
        }
    }
}

/// A retryable operation exhausted its attempts.
#[derive(Debug)]
pub struct RetryExhausted {
    /// The error from the final attempt.
    pub last_error: CoreError,
    /// How many attempts were made.
    pub attempts: u32,
}

impl std::fmt::Display for RetryExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operation failed after {} attempt(s): {}",
            self.attempts, self.last_error
        )
    }
}

impl std::error::Error for RetryExhausted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last_error)
    }
}

/// Run `op` under `policy`, retrying only errors for which
/// [`CoreError::is_retryable`] holds, and stopping early if `cancel` fires.
///
/// # Errors
/// Returns [`RetryExhausted`] once attempts are exhausted, the error kind is
/// not retryable, or cancellation was observed between attempts.
pub fn with_retry<T>(
    policy: RetryPolicy,
    cancel: &CancelToken,
    mut op: impl FnMut() -> Result<T, CoreError>,
) -> Result<T, RetryExhausted> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(last_error) => {
                let retryable = last_error.is_retryable();
                if !retryable || attempts >= policy.max_attempts || cancel.is_canceled() {
                    return Err(RetryExhausted {
                        last_error,
                        attempts,
                    });
                }
                tracing::debug!(attempts, "retrying after transient failure");
                std::thread::sleep(policy.interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitdocdb_git::GitError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn succeeds_without_retry() {
        let cancel = CancelToken::new();
        let result = with_retry(fast_policy(), &cancel, || Ok::<_, CoreError>(7));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn retries_transient_errors_then_succeeds() {
        let cancel = CancelToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_closure = Arc::clone(&calls);
        let result = with_retry(fast_policy(), &cancel, move || {
            let n = calls_in_closure.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(CoreError::from(GitError::CannotConnect {
                    remote: "https://example.com".into(),
                    message: "connection refused".into(),
                }))
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn non_retryable_errors_fail_fast() {
        let cancel = CancelToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_closure = Arc::clone(&calls);
        let err = with_retry(fast_policy(), &cancel, move || {
            calls_in_closure.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(CoreError::from(GitError::PushPermissionDenied {
                remote: "https://example.com".into(),
            }))
        })
        .unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exhausts_at_max_attempts() {
        let cancel = CancelToken::new();
        let err = with_retry(fast_policy(), &cancel, || {
            Err::<(), _>(CoreError::from(GitError::RequestTimeout {
                remote: "https://example.com".into(),
                elapsed_secs: 7,
            }))
        })
        .unwrap_err();
        assert_eq!(err.attempts, 3);
    }

    #[test]
    fn cancellation_stops_retrying() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_closure = Arc::clone(&calls);
        let err = with_retry(fast_policy(), &cancel, move || {
            calls_in_closure.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(CoreError::from(GitError::CannotConnect {
                remote: "https://example.com".into(),
                message: "down".into(),
            }))
        })
        .unwrap_err();
        assert_eq!(err.attempts, 1);
    }
}
