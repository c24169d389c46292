//! `gitdocdb` — an offline-first, versioned JSON document database backed by
//! a Git repository.
//!
//! [`Database`] is the single public entry point: [`Database::open`] loads
//! or creates a working tree, [`Database::get`] reads documents directly
//! from HEAD, and [`Database::put`]/[`Database::delete`]/[`Database::try_sync`]
//! submit mutating work to a per-database task queue so that the working
//! tree and the Git index have exactly one writer at a time.

pub mod config;
pub mod error;
mod registry;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use gitdocdb_core::model::{ChangeOperation, DocId, SerializationMode, SyncResult};
use gitdocdb_core::queue::{CancelToken, TaskQueue};
use gitdocdb_core::sync::events::describe_error;
use gitdocdb_core::sync::{sync_once, EventChannel, Listener, RetryPolicy, SyncConfig, SyncEvent};
use gitdocdb_core::{store, CoreError};
use gitdocdb_git::{Author, GitRepo, GixRepo};
use serde_json::Value;

pub use config::DatabaseOptions;
pub use error::GitDocDbError;

const DEFAULT_BRANCH: &str = "main";

fn local_ref_name() -> String {
    format!("refs/heads/{DEFAULT_BRANCH}")
}

/// The identity this library commits as, for bootstrap, put/delete, and
/// merge/combine commits (no configuration option names one; see
/// `DESIGN.md`).
fn identity(options: &DatabaseOptions) -> Author {
    Author {
        name: "gitdocdb".to_owned(),
        email: format!("gitdocdb@{}", options.db_name),
        timestamp: now_unix(),
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// A handle to an open, git-backed document database.
///
/// Cheap to clone: internally an [`Arc`] over the shared state, mirroring
/// the one-handle-per-process-per-path invariant enforced by [`registry`].
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    options: DatabaseOptions,
    repo: Mutex<GixRepo>,
    local_ref: String,
    canonical_path: PathBuf,
    queue: TaskQueue,
    events: Mutex<EventChannel>,
    live: Mutex<Option<LiveSync>>,
}

struct LiveSync {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Database {
    /// Open (or create) the database at `options.local_dir`.
    ///
    /// If this process already has `local_dir` open, returns a clone of the
    /// existing handle rather than erroring ("process-wide
    /// registry... to prevent double-open" — see `DESIGN.md` for why a
    /// second `open` is a handle clone rather than an error here).
    ///
    /// # Errors
    /// Returns [`GitDocDbError::Io`] if `local_dir` cannot be created, or a
    /// git-object-database error opening/initializing/cloning the repository.
    pub fn open(options: DatabaseOptions) -> Result<Self, GitDocDbError> {
        std::fs::create_dir_all(&options.local_dir)?;
        let key = registry::canonical_key(&options.local_dir);
        if let Some(inner) = registry::lookup(&key) {
            return Ok(Self { inner });
        }

        let git_dir = options.local_dir.join(".git");
        let repo = if git_dir.exists() {
            GixRepo::open(&options.local_dir)?
        } else if options.connection.kind != config::ConnectionKind::None {
            let url = options.connection.url.clone().ok_or_else(|| GitDocDbError::ConfigError {
                path: PathBuf::new(),
                detail: "connection.url is required to clone a github/ssh remote".to_owned(),
            })?;
            GixRepo::clone(&url, &options.local_dir, &options.connection.credentials())?
        } else {
            GixRepo::init(&options.local_dir)?
        };

        let local_ref = local_ref_name();
        if repo.resolve_ref(&local_ref)?.is_none() {
            bootstrap(&repo, &local_ref, &options)?;
        }

        let inner = Arc::new(DatabaseInner {
            options,
            repo: Mutex::new(repo),
            local_ref,
            canonical_path: key.clone(),
            queue: TaskQueue::new(),
            events: Mutex::new(EventChannel::new()),
            live: Mutex::new(None),
        });
        registry::register(key, &inner);
        Ok(Self { inner })
    }

    /// Read a document directly from HEAD, bypassing the task queue — a
    /// reader never waits on the queue.
    ///
    /// # Errors
    /// Returns [`GitDocDbError::InvalidId`] for a malformed `id`, or
    /// propagates a git-object-database error reading the tree or blob.
    pub fn get(&self, id: &str) -> Result<Option<Value>, GitDocDbError> {
        let id = parse_id(id)?;
        let repo = self.inner.repo.lock().expect("repo mutex poisoned");
        let Some(head) = repo.resolve_ref(&self.inner.local_ref)? else {
            return Ok(None);
        };
        let tree = repo.read_commit(head)?.tree_oid;
        let doc = store::get_document(&*repo, tree, &id, self.inner.options.serialization)?;
        Ok(doc.map(|d| d.doc))
    }

    /// Insert or update a document, submitted via the task queue.
    ///
    /// If `doc` carries a string `_id` field, that id is validated and used;
    /// otherwise a fresh id is generated using `name_prefix`.
    ///
    /// # Errors
    /// Returns [`GitDocDbError::InvalidId`] for a malformed supplied `_id`,
    /// [`GitDocDbError::Closing`] if the database is closing, or propagates
    /// a git-object-database error.
    pub fn put(&self, mut doc: Value) -> Result<DocId, GitDocDbError> {
        let id = resolve_put_id(&doc, self.inner.options.name_prefix.as_deref())?;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("_id".to_owned(), Value::String(id.to_string()));
        }

        let inner = Arc::clone(&self.inner);
        let id_for_task = id.clone();
        let handle = inner
            .queue
            .submit(format!("put:{id}"), move |_cancel| put_task(&inner, &id_for_task, &doc))
            .map_err(GitDocDbError::from)?;
        handle.join().map_err(GitDocDbError::from)?;
        Ok(id)
    }

    /// Delete a document by id, submitted via the task queue. Returns
    /// whether a document existed at that id.
    ///
    /// # Errors
    /// Returns [`GitDocDbError::InvalidId`] for a malformed `id`,
    /// [`GitDocDbError::Closing`] if the database is closing, or propagates
    /// a git-object-database error.
    pub fn delete(&self, id: &str) -> Result<bool, GitDocDbError> {
        let id = parse_id(id)?;
        let inner = Arc::clone(&self.inner);
        let id_for_task = id.clone();
        let handle = inner
            .queue
            .submit(format!("delete:{id}"), move |_cancel| delete_task(&inner, &id_for_task))
            .map_err(GitDocDbError::from)?;
        handle.join().map_err(GitDocDbError::from)
    }

    /// Run one sync cycle immediately, submitted via the task queue, and
    /// block for its result.
    ///
    /// # Errors
    /// Returns [`GitDocDbError::ConfigError`] if no remote `connection.url`
    /// is configured, or propagates a sync-cycle failure.
    pub fn try_sync(&self) -> Result<SyncResult, GitDocDbError> {
        let config = sync_config(&self.inner.options)?;
        let inner = Arc::clone(&self.inner);
        let handle = inner
            .queue
            .submit("sync", move |cancel| sync_task(&inner, &config, cancel))
            .map_err(GitDocDbError::from)?;
        handle.join().map_err(GitDocDbError::from)
    }

    /// Register a listener invoked for every sync lifecycle event:
    /// before-live-sync, start, progress, change, pause, resume, complete,
    /// error.
    pub fn register_sync_listener(&self, listener: Listener) {
        self.inner
            .events
            .lock()
            .expect("events mutex poisoned")
            .subscribe(listener);
    }

    /// Start the periodic background sync loop, if not already running
    ///. A no-op if live sync is already active.
    ///
    /// # Errors
    /// Returns [`GitDocDbError::ConfigError`] if no remote `connection.url`
    /// is configured.
    pub fn start_live(&self) -> Result<(), GitDocDbError> {
        let mut live = self.inner.live.lock().expect("live mutex poisoned");
        if live.is_some() {
            return Ok(());
        }
        // Validate eagerly so a misconfigured database fails at start_live,
        // not silently on its first tick.
        sync_config(&self.inner.options)?;

        let interval = self.inner.options.interval();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let loop_inner = Arc::clone(&self.inner);
        let thread = std::thread::Builder::new()
            .name("gitdocdb-live-sync".into())
            .spawn(move || live_sync_loop(&loop_inner, interval, &stop_for_thread))
            .expect("failed to spawn live sync thread");
        *live = Some(LiveSync { stop, thread });
        Ok(())
    }

    /// Stop the periodic background sync loop, blocking until its current
    /// tick (if any) finishes. A no-op if live sync isn't running.
    pub fn stop_live(&self) {
        let mut live = self.inner.live.lock().expect("live mutex poisoned");
        if let Some(handle) = live.take() {
            handle.stop.store(true, Ordering::Release);
            let _ = handle.thread.join();
        }
    }

    /// Stop live sync, drain the task queue, and release this process's
    /// claim on the database's directory.
    ///
    /// # Errors
    /// Returns [`GitDocDbError::CloseTimeout`] if `timeout` elapses with
    /// tasks still queued and `force` is `false`.
    pub fn close(&self, timeout: Duration, force: bool) -> Result<(), GitDocDbError> {
        self.stop_live();
        self.inner.queue.close(timeout, force).map_err(GitDocDbError::from)?;
        registry::unregister(&self.inner.canonical_path);
        Ok(())
    }
}

fn parse_id(id: &str) -> Result<DocId, GitDocDbError> {
    DocId::new(id).map_err(|e| GitDocDbError::InvalidId {
        id: e.value,
        reason: e.reason,
    })
}

fn resolve_put_id(doc: &Value, name_prefix: Option<&str>) -> Result<DocId, GitDocDbError> {
    match doc.get("_id").and_then(Value::as_str) {
        Some(id) => parse_id(id),
        None => Ok(DocId::generate(name_prefix)),
    }
}

fn bootstrap(repo: &GixRepo, local_ref: &str, options: &DatabaseOptions) -> Result<(), GitDocDbError> {
    let who = identity(options);

    let empty_tree = repo.write_tree(&[])?;
    let first = repo.write_commit(empty_tree, &[], &who, &who, "first commit")?;
    repo.update_ref(local_ref, first)?;

    let db_id = DocId::generate(None).to_string();
    let id_only = serde_json::json!({ "dbId": db_id });
    let id_blob = repo.write_blob(&gitdocdb_core::format::encode(&id_only, SerializationMode::Json))?;
    let id_tree = store::write_tree_from_paths(repo, &[(format!("{}/info", store::METADATA_DIR), id_blob)])?;
    let second = repo.write_commit(id_tree, &[first], &who, &who, "set database id")?;
    repo.update_ref(local_ref, second)?;

    let info = serde_json::json!({
        "creator": "gitdocdb",
        "version": env!("CARGO_PKG_VERSION"),
        "dbId": db_id,
    });
    let info_blob = repo.write_blob(&gitdocdb_core::format::encode(&info, SerializationMode::Json))?;
    let info_tree = store::write_tree_from_paths(repo, &[(format!("{}/info", store::METADATA_DIR), info_blob)])?;
    let third = repo.write_commit(info_tree, &[second], &who, &who, "put appinfo")?;
    repo.update_ref(local_ref, third)?;
    Ok(())
}

fn put_task(inner: &DatabaseInner, id: &DocId, doc: &Value) -> Result<(), CoreError> {
    let repo = inner.repo.lock().expect("repo mutex poisoned");
    let head = repo.resolve_ref(&inner.local_ref)?;
    let parent_tree = match head {
        Some(oid) => repo.read_commit(oid)?.tree_oid,
        None => repo.write_tree(&[])?,
    };
    let outcome = store::put_document(&*repo, parent_tree, id, doc, inner.options.serialization)?;
    let who = identity(&inner.options);
    let message = store::commit_message(outcome.operation, id, inner.options.serialization, outcome.doc.file_oid);
    let parents: Vec<_> = head.into_iter().collect();
    let commit = repo.write_commit(outcome.tree, &parents, &who, &who, &message)?;
    repo.update_ref(&inner.local_ref, commit)?;
    Ok(())
}

fn delete_task(inner: &DatabaseInner, id: &DocId) -> Result<bool, CoreError> {
    let repo = inner.repo.lock().expect("repo mutex poisoned");
    let Some(head) = repo.resolve_ref(&inner.local_ref)? else {
        return Ok(false);
    };
    let tree = repo.read_commit(head)?.tree_oid;
    let Some(outcome) = store::delete_document(&*repo, tree, id, inner.options.serialization)? else {
        return Ok(false);
    };
    let who = identity(&inner.options);
    let message = store::commit_message(
        ChangeOperation::Delete,
        id,
        inner.options.serialization,
        outcome.doc.file_oid,
    );
    let commit = repo.write_commit(outcome.tree, &[head], &who, &who, &message)?;
    repo.update_ref(&inner.local_ref, commit)?;
    Ok(true)
}

fn sync_config(options: &DatabaseOptions) -> Result<SyncConfig, GitDocDbError> {
    let remote_url = options.connection.url.clone().ok_or_else(|| GitDocDbError::ConfigError {
        path: PathBuf::new(),
        detail: "sync requires a configured connection.url".to_owned(),
    })?;
    Ok(SyncConfig {
        remote_url,
        branch: DEFAULT_BRANCH.to_owned(),
        credentials: options.connection.credentials(),
        strategy: options.conflict_resolution_strategy,
        key_of_unique_array: options.key_of_unique_array.clone(),
        serialization: options.serialization,
        retry: RetryPolicy {
            max_attempts: options.network_retry,
            interval: options.network_retry_interval(),
        },
        no_merge_base: options.combine_db_strategy.to_engine_behavior(),
        committer: identity(options),
        include_commits: options.include_commits,
    })
}

fn sync_task(inner: &DatabaseInner, config: &SyncConfig, cancel: &CancelToken) -> Result<SyncResult, CoreError> {
    let repo = inner.repo.lock().expect("repo mutex poisoned");
    let events = inner.events.lock().expect("events mutex poisoned");
    sync_once(&*repo, &inner.local_ref, config, None, cancel, &events)
}

fn live_sync_loop(inner: &Arc<DatabaseInner>, interval: Duration, stop: &Arc<AtomicBool>) {
    while !stop.load(Ordering::Acquire) {
        std::thread::sleep(interval);
        if stop.load(Ordering::Acquire) {
            break;
        }
        if inner.queue.pending_count() > 0 {
            continue;
        }

        inner
            .events
            .lock()
            .expect("events mutex poisoned")
            .emit(&SyncEvent::BeforeLiveSync);

        let Ok(config) = sync_config(&inner.options) else {
            continue;
        };
        let task_inner = Arc::clone(inner);
        let submitted = inner
            .queue
            .submit("live-sync", move |cancel| sync_task(&task_inner, &config, cancel));
        if let Err(err) = submitted.and_then(|handle| handle.join()) {
            inner
                .events
                .lock()
                .expect("events mutex poisoned")
                .emit(&SyncEvent::Error(describe_error(&err)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_in(dir: &std::path::Path) -> DatabaseOptions {
        DatabaseOptions::new("notes", dir)
    }

    #[test]
    fn open_bootstraps_a_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        let repo = db.inner.repo.lock().unwrap();
        let head = repo.resolve_ref(&db.inner.local_ref).unwrap();
        assert!(head.is_some());
        drop(repo);
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn reopening_the_same_directory_returns_the_same_handle() {
        let dir = tempfile::tempdir().unwrap();
        let db1 = Database::open(options_in(dir.path())).unwrap();
        let db2 = Database::open(options_in(dir.path())).unwrap();
        assert!(Arc::ptr_eq(&db1.inner, &db2.inner));
        db1.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        let id = db.put(serde_json::json!({"title": "hello"})).unwrap();
        let doc = db.get(id.as_str()).unwrap().unwrap();
        assert_eq!(doc["title"], "hello");
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn put_with_explicit_id_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        let id = db.put(serde_json::json!({"_id": "nara", "deer": 100})).unwrap();
        assert_eq!(id.as_str(), "nara");
        assert!(db.get("nara").unwrap().is_some());
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn put_with_invalid_explicit_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        let err = db.put(serde_json::json!({"_id": "/bad"})).unwrap_err();
        assert!(matches!(err, GitDocDbError::InvalidId { .. }));
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn get_missing_document_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        assert!(db.get("ghost").unwrap().is_none());
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn delete_removes_a_put_document() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        let id = db.put(serde_json::json!({"_id": "nara"})).unwrap();
        assert!(db.delete(id.as_str()).unwrap());
        assert!(db.get(id.as_str()).unwrap().is_none());
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn delete_missing_document_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        assert!(!db.delete("ghost").unwrap());
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn try_sync_without_connection_url_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(options_in(dir.path())).unwrap();
        let err = db.try_sync().unwrap_err();
        assert!(matches!(err, GitDocDbError::ConfigError { .. }));
        db.close(Duration::from_secs(1), false).unwrap();
    }

    #[test]
    fn close_unregisters_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let db = Database::open(options_in(&path)).unwrap();
        db.close(Duration::from_secs(1), false).unwrap();
        assert!(registry::lookup(&registry::canonical_key(&path)).is_none());
    }
}
