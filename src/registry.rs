//! Process-wide open-database registry.
//!
//! A canonical path may be open in at most one `Database` handle per
//! process: a single struct guarded by a mutex, touched only during
//! open/close, never held across an operation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use crate::DatabaseInner;

static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Weak<DatabaseInner>>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<PathBuf, Weak<DatabaseInner>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Canonicalize `path` for use as a registry key.
///
/// Falls back to the path as given if it doesn't exist yet (canonicalize
/// requires the path to exist; a not-yet-created local directory is a
/// valid `open` target).
pub(crate) fn canonical_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Look up an already-open handle for `path`, pruning any stale (dropped)
/// entry found along the way.
pub(crate) fn lookup(path: &Path) -> Option<Arc<DatabaseInner>> {
    let mut guard = registry().lock().expect("registry mutex poisoned");
    match guard.get(path).and_then(Weak::upgrade) {
        Some(inner) => Some(inner),
        None => {
            guard.remove(path);
            None
        }
    }
}

/// Register a freshly opened handle for `path`. Callers must have already
/// confirmed via [`lookup`] that no live handle exists.
pub(crate) fn register(path: PathBuf, inner: &Arc<DatabaseInner>) {
    let mut guard = registry().lock().expect("registry mutex poisoned");
    guard.insert(path, Arc::downgrade(inner));
}

/// Remove `path`'s entry, e.g. once a `Database` is closed.
pub(crate) fn unregister(path: &Path) {
    let mut guard = registry().lock().expect("registry mutex poisoned");
    guard.remove(path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_falls_back_for_missing_path() {
        let p = Path::new("/definitely/does/not/exist/xyz");
        assert_eq!(canonical_key(p), p.to_path_buf());
    }

    #[test]
    fn lookup_on_empty_registry_is_none() {
        let key = PathBuf::from("/gitdocdb-registry-test-never-registered");
        assert!(lookup(&key).is_none());
    }
}
