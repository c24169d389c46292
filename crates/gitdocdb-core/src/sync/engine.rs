//! The sync engine: classify and drive one sync cycle.

use gitdocdb_git::{Author, Credentials, GitOid, GitRepo};

use crate::error::CoreError;
use crate::merge::{diff_tree, merge_trees, ConflictStrategy, UserMergeFn};
use crate::model::{Conflict, SerializationMode, SideChanges, SyncAction, SyncResult};
use crate::queue::CancelToken;

use super::events::{EventChannel, SyncEvent};
use super::retry::{with_retry, RetryPolicy};

/// What to do when a sync finds no common ancestor between local and remote
/// history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoMergeBaseBehavior {
    /// Surface [`CoreError::NoMergeBaseFound`].
    Fail,
    /// Emit an empty ([`SyncAction::Nop`]) result without touching history.
    Nop,
    /// Join the two histories with a synthetic commit (bootstrap only).
    Combine,
    /// Discard local history and adopt remote's wholesale.
    AcceptTheirs,
}

/// Static configuration for one sync cycle.
pub struct SyncConfig {
    /// HTTPS remote URL.
    pub remote_url: String,
    /// The branch synced on both sides.
    pub branch: String,
    /// Credentials used for fetch/push.
    pub credentials: Credentials,
    /// Per-document conflict resolution policy.
    pub strategy: ConflictStrategy,
    /// Field names whose array values are deduplicated after a document merge.
    pub key_of_unique_array: Vec<String>,
    /// On-disk document encoding.
    pub serialization: SerializationMode,
    /// Retry policy for fetch/push.
    pub retry: RetryPolicy,
    /// Policy for a sync with no common ancestor.
    pub no_merge_base: NoMergeBaseBehavior,
    /// Identity used for merge/combine commits this engine authors.
    pub committer: Author,
    /// Whether to populate [`SyncResult::commits`].
    pub include_commits: bool,
}

/// Run one sync cycle against `local_ref` (state machine:
/// Idle → Fetching → Classifying → action → Emitting → Idle).
///
/// # Errors
/// Returns [`CoreError`] for a fatal repo-state failure, a non-retryable
/// network failure, or (per [`NoMergeBaseBehavior::Fail`])
/// [`CoreError::NoMergeBaseFound`].
pub fn sync_once<R: GitRepo>(
    repo: &R,
    local_ref: &str,
    config: &SyncConfig,
    user_fn: Option<&UserMergeFn<'_>>,
    cancel: &CancelToken,
    events: &EventChannel,
) -> Result<SyncResult, CoreError> {
    events.emit(&SyncEvent::Start);

    if cancel.is_canceled() {
        events.emit(&SyncEvent::Complete(SyncResult::canceled()));
        return Ok(SyncResult::canceled());
    }

    let local = repo
        .resolve_ref(local_ref)?
        .ok_or_else(|| CoreError::Git(gitdocdb_git::GitError::NotFound {
            message: format!("local ref `{local_ref}` does not exist"),
        }))?;

    events.emit(&SyncEvent::Progress("fetching".into()));
    let remote_tracking_ref = format!("refs/remotes/origin/{}", config.branch);
    let remote = with_retry(config.retry, cancel, || {
        repo.fetch(&config.remote_url, &config.branch, &config.credentials)
            .map_err(CoreError::from)
    })
    .map_err(|e| e.last_error)?;
    repo.update_ref(&remote_tracking_ref, remote)?;

    if cancel.is_canceled() {
        events.emit(&SyncEvent::Complete(SyncResult::canceled()));
        return Ok(SyncResult::canceled());
    }

    events.emit(&SyncEvent::Progress("classifying".into()));
    let result = drive(repo, local_ref, local, remote, config, user_fn, cancel)?;
    events.emit(&SyncEvent::Complete(result.clone()));
    Ok(result)
}

#[allow(clippy::too_many_lines)]
fn drive<R: GitRepo>(
    repo: &R,
    local_ref: &str,
    local: GitOid,
    remote: GitOid,
    config: &SyncConfig,
    user_fn: Option<&UserMergeFn<'_>>,
    cancel: &CancelToken,
) -> Result<SyncResult, CoreError> {
    if local == remote {
        return Ok(SyncResult::nop());
    }

    let base = repo.find_merge_base(local, remote)?;

    let Some(base) = base else {
        return no_merge_base(repo, local_ref, local, remote, config);
    };

    if base == remote {
        // Push: local is ahead, remote hasn't moved.
        with_retry(config.retry, cancel, || {
            repo.push(&config.remote_url, &config.branch, &config.credentials, false)
                .map_err(CoreError::from)
        })
        .map_err(|e| e.last_error)?;
        let local_tree = repo.read_commit(local)?.tree_oid;
        let remote_tree = repo.read_commit(remote)?.tree_oid;
        let remote_changes = diff_tree(repo, Some(remote_tree), Some(local_tree), config.serialization)?;
        return Ok(SyncResult {
            action: Some(SyncAction::Push),
            commits: commits_for(repo, config, Some(remote), Some(local), Side::Remote)?,
            changes: SideChanges {
                local: Vec::new(),
                remote: remote_changes,
            },
            conflicts: None,
        });
    }

    if base == local {
        // Fast-forward: remote is ahead, local hasn't moved.
        let local_tree = repo.read_commit(local)?.tree_oid;
        let remote_tree = repo.read_commit(remote)?.tree_oid;
        let local_changes = diff_tree(repo, Some(local_tree), Some(remote_tree), config.serialization)?;
        repo.update_ref(local_ref, remote)?;
        return Ok(SyncResult {
            action: Some(SyncAction::FastForwardMerge),
            commits: commits_for(repo, config, Some(local), Some(remote), Side::Local)?,
            changes: SideChanges {
                local: local_changes,
                remote: Vec::new(),
            },
            conflicts: None,
        });
    }

    // Both sides advanced independently: three-way tree merge.
    let base_tree = repo.read_commit(base)?.tree_oid;
    let local_tree = repo.read_commit(local)?.tree_oid;
    let remote_tree = repo.read_commit(remote)?.tree_oid;

    let outcome = merge_trees(
        repo,
        Some(base_tree),
        local_tree,
        remote_tree,
        config.strategy,
        user_fn,
        config.serialization,
        &config.key_of_unique_array,
    )?;

    let has_conflicts = !outcome.conflicts.is_empty();
    let message = merge_commit_message(&outcome.conflicts, config.strategy);
    let merge_oid = repo.write_commit(
        outcome.tree_oid,
        &[local, remote],
        &config.committer,
        &config.committer,
        &message,
    )?;
    repo.update_ref(local_ref, merge_oid)?;

    with_retry(config.retry, cancel, || {
        repo.push(&config.remote_url, &config.branch, &config.credentials, false)
            .map_err(CoreError::from)
    })
    .map_err(|e| e.last_error)?;

    let action = if has_conflicts {
        SyncAction::ResolveConflictsAndPush
    } else {
        SyncAction::MergeAndPush
    };

    Ok(SyncResult {
        action: Some(action),
        commits: commits_for(repo, config, Some(base), Some(merge_oid), Side::Both)?,
        changes: SideChanges {
            local: outcome.local_changes,
            remote: outcome.remote_changes,
        },
        conflicts: if outcome.conflicts.is_empty() {
            None
        } else {
            Some(
                outcome
                    .conflicts
                    .into_iter()
                    .map(|c| Conflict {
                        id: c.id,
                        strategy: c.strategy,
                        operation: c.operation,
                    })
                    .collect(),
            )
        },
    })
}

fn no_merge_base<R: GitRepo>(
    repo: &R,
    local_ref: &str,
    local: GitOid,
    remote: GitOid,
    config: &SyncConfig,
) -> Result<SyncResult, CoreError> {
    match config.no_merge_base {
        NoMergeBaseBehavior::Fail => Err(CoreError::NoMergeBaseFound),
        NoMergeBaseBehavior::Nop => Ok(SyncResult::nop()),
        NoMergeBaseBehavior::AcceptTheirs => {
            let local_tree = repo.read_commit(local)?.tree_oid;
            let remote_tree = repo.read_commit(remote)?.tree_oid;
            let local_changes = diff_tree(repo, Some(local_tree), Some(remote_tree), config.serialization)?;
            repo.update_ref(local_ref, remote)?;
            Ok(SyncResult {
                action: Some(SyncAction::FastForwardMerge),
                commits: commits_for(repo, config, Some(local), Some(remote), Side::Local)?,
                changes: SideChanges {
                    local: local_changes,
                    remote: Vec::new(),
                },
                conflicts: None,
            })
        }
        NoMergeBaseBehavior::Combine => {
            let local_tree = repo.read_commit(local)?.tree_oid;
            let remote_tree = repo.read_commit(remote)?.tree_oid;
            let outcome = merge_trees(
                repo,
                None,
                local_tree,
                remote_tree,
                config.strategy,
                None,
                config.serialization,
                &config.key_of_unique_array,
            )?;
            let message = "combine database head with theirs".to_string();
            let commit_oid = repo.write_commit(
                outcome.tree_oid,
                &[local, remote],
                &config.committer,
                &config.committer,
                &message,
            )?;
            repo.update_ref(local_ref, commit_oid)?;
            Ok(SyncResult {
                action: Some(SyncAction::CombineDatabaseWithTheirs),
                commits: commits_for(repo, config, None, Some(commit_oid), Side::Local)?,
                changes: SideChanges {
                    local: outcome.local_changes,
                    remote: outcome.remote_changes,
                },
                conflicts: if outcome.conflicts.is_empty() {
                    None
                } else {
                    Some(
                        outcome
                            .conflicts
                            .into_iter()
                            .map(|c| Conflict {
                                id: c.id,
                                strategy: c.strategy,
                                operation: c.operation,
                            })
                            .collect(),
                    )
                },
            })
        }
    }
}

fn merge_commit_message(conflicts: &[crate::model::Conflict], strategy: ConflictStrategy) -> String {
    if conflicts.is_empty() {
        return "merge".to_string();
    }
    let ids = conflicts
        .iter()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[resolve conflicts] update-{}: {ids}", strategy.as_str())
}

/// Which side of a sync a batch of newly-reachable commits belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// Only local gained these commits (e.g. a fast-forward or combine).
    Local,
    /// Only remote gained these commits (e.g. a push with no local rewrite).
    Remote,
    /// Both sides converge on the same commits (a merge commit that gets
    /// pushed, so local and remote end up identical).
    Both,
}

fn commits_for<R: GitRepo>(
    repo: &R,
    config: &SyncConfig,
    old: Option<GitOid>,
    new: Option<GitOid>,
    side: Side,
) -> Result<Option<crate::model::SideCommits>, CoreError> {
    if !config.include_commits {
        return Ok(None);
    }
    let Some(new) = new else { return Ok(None) };
    let commits = repo.list_commits_between(old, new)?;
    let side_commits = match side {
        Side::Local => crate::model::SideCommits {
            local: commits,
            remote: Vec::new(),
        },
        Side::Remote => crate::model::SideCommits {
            local: Vec::new(),
            remote: commits,
        },
        Side::Both => crate::model::SideCommits {
            local: commits.clone(),
            remote: commits,
        },
    };
    Ok(Some(side_commits))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::hash::{Hash, Hasher};

    use gitdocdb_git::{CommitInfo, GitError, TreeEntry};
    use serde_json::json;

    use super::*;
    use crate::queue::CancelToken;

    /// An in-memory [`GitRepo`] double: object graph lives in `RefCell`-backed
    /// maps, OIDs are content-addressed the same way git's are. `fetch` is
    /// deliberately `unimplemented!` — these tests exercise `drive` directly
    /// rather than going through `sync_once`'s fetch step.
    #[derive(Default)]
    struct FakeRepo {
        blobs: RefCell<HashMap<GitOid, Vec<u8>>>,
        trees: RefCell<HashMap<GitOid, Vec<TreeEntry>>>,
        commits: RefCell<HashMap<GitOid, CommitInfo>>,
        refs: RefCell<HashMap<String, GitOid>>,
        pushes: RefCell<Vec<(String, String, bool)>>,
    }

    fn content_oid(tag: u8, data: &[u8]) -> GitOid {
        let mut h1 = std::collections::hash_map::DefaultHasher::new();
        tag.hash(&mut h1);
        data.hash(&mut h1);
        let a = h1.finish();
        let mut h2 = std::collections::hash_map::DefaultHasher::new();
        a.hash(&mut h2);
        data.len().hash(&mut h2);
        let b = h2.finish();
        let mut bytes = [0u8; 20];
        bytes[0..8].copy_from_slice(&a.to_be_bytes());
        bytes[8..16].copy_from_slice(&b.to_be_bytes());
        bytes[16..20].copy_from_slice(&a.to_le_bytes()[0..4]);
        GitOid::from_bytes(bytes)
    }

    fn test_author() -> Author {
        Author {
            name: "Test".into(),
            email: "test@example.com".into(),
            timestamp: 0,
        }
    }

    impl FakeRepo {
        fn ancestors(&self, start: Option<GitOid>) -> HashSet<GitOid> {
            let mut seen = HashSet::new();
            let mut stack = Vec::new();
            if let Some(oid) = start {
                stack.push(oid);
            }
            while let Some(oid) = stack.pop() {
                if !seen.insert(oid) {
                    continue;
                }
                if let Some(commit) = self.commits.borrow().get(&oid) {
                    stack.extend(commit.parents.iter().copied());
                }
            }
            seen
        }

        /// Build a commit with a fixed test identity.
        fn commit(&self, tree: GitOid, parents: &[GitOid], message: &str) -> GitOid {
            self.write_commit(tree, parents, &test_author(), &test_author(), message)
                .unwrap()
        }

        fn push_count(&self) -> usize {
            self.pushes.borrow().len()
        }
    }

    impl GitRepo for FakeRepo {
        fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
            self.commits
                .borrow()
                .get(&oid)
                .cloned()
                .ok_or_else(|| GitError::NotFound {
                    message: format!("no commit {oid}"),
                })
        }

        fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
            self.trees
                .borrow()
                .get(&oid)
                .cloned()
                .ok_or_else(|| GitError::NotFound {
                    message: format!("no tree {oid}"),
                })
        }

        fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
            self.blobs
                .borrow()
                .get(&oid)
                .cloned()
                .ok_or_else(|| GitError::NotFound {
                    message: format!("no blob {oid}"),
                })
        }

        fn hash_blob(&self, data: &[u8]) -> GitOid {
            content_oid(b'b', data)
        }

        fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
            let oid = content_oid(b'b', data);
            self.blobs.borrow_mut().insert(oid, data.to_vec());
            Ok(oid)
        }

        fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
            let mut buf = Vec::new();
            for entry in entries {
                buf.extend(entry.name.as_bytes());
                buf.push(0);
                buf.extend(entry.oid.as_bytes());
            }
            let oid = content_oid(b't', &buf);
            self.trees.borrow_mut().insert(oid, entries.to_vec());
            Ok(oid)
        }

        fn write_commit(
            &self,
            tree: GitOid,
            parents: &[GitOid],
            author: &Author,
            committer: &Author,
            message: &str,
        ) -> Result<GitOid, GitError> {
            let mut buf = Vec::new();
            buf.extend(tree.as_bytes());
            for p in parents {
                buf.extend(p.as_bytes());
            }
            buf.extend(message.as_bytes());
            buf.extend(author.name.as_bytes());
            buf.extend(committer.name.as_bytes());
            let oid = content_oid(b'c', &buf);
            self.commits.borrow_mut().insert(
                oid,
                CommitInfo {
                    oid,
                    tree_oid: tree,
                    parents: parents.to_vec(),
                    message: message.to_string(),
                    author: author.clone(),
                    committer: committer.clone(),
                },
            );
            Ok(oid)
        }

        fn resolve_ref(&self, name: &str) -> Result<Option<GitOid>, GitError> {
            Ok(self.refs.borrow().get(name).copied())
        }

        fn update_ref(&self, name: &str, oid: GitOid) -> Result<(), GitError> {
            self.refs.borrow_mut().insert(name.to_string(), oid);
            Ok(())
        }

        fn find_merge_base(&self, a: GitOid, b: GitOid) -> Result<Option<GitOid>, GitError> {
            let ancestors_a = self.ancestors(Some(a));
            let mut queue = VecDeque::new();
            let mut seen = HashSet::new();
            queue.push_back(b);
            while let Some(oid) = queue.pop_front() {
                if !seen.insert(oid) {
                    continue;
                }
                if ancestors_a.contains(&oid) {
                    return Ok(Some(oid));
                }
                if let Some(commit) = self.commits.borrow().get(&oid) {
                    queue.extend(commit.parents.iter().copied());
                }
            }
            Ok(None)
        }

        fn list_commits_between(
            &self,
            old: Option<GitOid>,
            new: GitOid,
        ) -> Result<Vec<CommitInfo>, GitError> {
            let excluded = self.ancestors(old);
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            collect_commits(self, new, &excluded, &mut seen, &mut out);
            Ok(out)
        }

        fn fetch(&self, _remote_url: &str, _branch: &str, _credentials: &Credentials) -> Result<GitOid, GitError> {
            unimplemented!("tests drive `drive` directly, bypassing fetch")
        }

        fn push(&self, remote_url: &str, branch: &str, _credentials: &Credentials, force: bool) -> Result<(), GitError> {
            self.pushes
                .borrow_mut()
                .push((remote_url.to_string(), branch.to_string(), force));
            Ok(())
        }
    }

    fn collect_commits(
        repo: &FakeRepo,
        oid: GitOid,
        excluded: &HashSet<GitOid>,
        seen: &mut HashSet<GitOid>,
        out: &mut Vec<CommitInfo>,
    ) {
        if excluded.contains(&oid) || !seen.insert(oid) {
            return;
        }
        let Some(commit) = repo.commits.borrow().get(&oid).cloned() else {
            return;
        };
        for parent in commit.parents.clone() {
            collect_commits(repo, parent, excluded, seen, out);
        }
        out.push(commit);
    }

    fn doc_tree(repo: &FakeRepo, docs: &[(&str, serde_json::Value)]) -> GitOid {
        let paths: Vec<(String, GitOid)> = docs
            .iter()
            .map(|(id, doc)| {
                let bytes = crate::format::encode(doc, SerializationMode::Json);
                let oid = repo.write_blob(&bytes).unwrap();
                (format!("{id}.json"), oid)
            })
            .collect();
        crate::store::write_tree_from_paths(repo, &paths).unwrap()
    }

    fn config(no_merge_base: NoMergeBaseBehavior, include_commits: bool) -> SyncConfig {
        SyncConfig {
            remote_url: "https://example.invalid/repo.git".to_string(),
            branch: "main".to_string(),
            credentials: Credentials::None,
            strategy: ConflictStrategy::Ours,
            key_of_unique_array: Vec::new(),
            serialization: SerializationMode::Json,
            retry: RetryPolicy::default(),
            no_merge_base,
            committer: test_author(),
            include_commits,
        }
    }

    const LOCAL_REF: &str = "refs/heads/main";

    #[test]
    fn nop_when_local_equals_remote() {
        let repo = FakeRepo::default();
        let tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let commit = repo.commit(tree, &[], "base");
        let config = config(NoMergeBaseBehavior::Fail, true);
        let result = drive(&repo, LOCAL_REF, commit, commit, &config, None, &CancelToken::new()).unwrap();
        assert_eq!(result.action, Some(SyncAction::Nop));
    }

    #[test]
    fn push_when_local_is_ahead() {
        let repo = FakeRepo::default();
        let base_tree = doc_tree(&repo, &[]);
        let base = repo.commit(base_tree, &[], "base");
        let ahead_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let ahead = repo.commit(ahead_tree, &[base], "add a");
        let config = config(NoMergeBaseBehavior::Fail, true);

        let result = drive(&repo, LOCAL_REF, ahead, base, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::Push));
        let commits = result.commits.unwrap();
        assert!(commits.local.is_empty());
        assert_eq!(commits.remote, vec![repo.read_commit(ahead).unwrap()]);
        assert_eq!(repo.push_count(), 1);
    }

    #[test]
    fn fast_forward_when_remote_is_ahead() {
        let repo = FakeRepo::default();
        let base_tree = doc_tree(&repo, &[]);
        let base = repo.commit(base_tree, &[], "base");
        let ahead_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let ahead = repo.commit(ahead_tree, &[base], "add a");
        let config = config(NoMergeBaseBehavior::Fail, true);

        let result = drive(&repo, LOCAL_REF, base, ahead, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::FastForwardMerge));
        let commits = result.commits.unwrap();
        assert_eq!(commits.local, vec![repo.read_commit(ahead).unwrap()]);
        assert!(commits.remote.is_empty());
        assert_eq!(repo.resolve_ref(LOCAL_REF).unwrap(), Some(ahead));
        assert_eq!(repo.push_count(), 0);
    }

    #[test]
    fn merge_and_push_with_non_overlapping_changes() {
        let repo = FakeRepo::default();
        let base_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let base = repo.commit(base_tree, &[], "base");
        let local_tree = doc_tree(&repo, &[("a", json!({"_id": "a"})), ("b", json!({"_id": "b"}))]);
        let local = repo.commit(local_tree, &[base], "add b");
        let remote_tree = doc_tree(&repo, &[("a", json!({"_id": "a"})), ("c", json!({"_id": "c"}))]);
        let remote = repo.commit(remote_tree, &[base], "add c");
        let config = config(NoMergeBaseBehavior::Fail, true);

        let result = drive(&repo, LOCAL_REF, local, remote, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::MergeAndPush));
        assert!(result.conflicts.is_none());
        let commits = result.commits.unwrap();
        assert_eq!(commits.local, commits.remote);
        assert_eq!(commits.local.len(), 1);
        assert_eq!(repo.push_count(), 1);
    }

    #[test]
    fn resolve_conflicts_and_push_with_overlapping_changes() {
        let repo = FakeRepo::default();
        let base_tree = doc_tree(&repo, &[("x", json!({"_id": "x", "count": 1}))]);
        let base = repo.commit(base_tree, &[], "base");
        let local_tree = doc_tree(&repo, &[("x", json!({"_id": "x", "count": 2}))]);
        let local = repo.commit(local_tree, &[base], "local bumps count");
        let remote_tree = doc_tree(&repo, &[("x", json!({"_id": "x", "count": 3}))]);
        let remote = repo.commit(remote_tree, &[base], "remote bumps count");
        let config = config(NoMergeBaseBehavior::Fail, false);

        let result = drive(&repo, LOCAL_REF, local, remote, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::ResolveConflictsAndPush));
        assert!(result.conflicts.is_some());
        assert_eq!(repo.push_count(), 1);
    }

    #[test]
    fn no_merge_base_fail_surfaces_error() {
        let repo = FakeRepo::default();
        let local_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let local = repo.commit(local_tree, &[], "local root");
        let remote_tree = doc_tree(&repo, &[("z", json!({"_id": "z"}))]);
        let remote = repo.commit(remote_tree, &[], "remote root");
        let config = config(NoMergeBaseBehavior::Fail, false);

        let err = drive(&repo, LOCAL_REF, local, remote, &config, None, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, CoreError::NoMergeBaseFound));
    }

    #[test]
    fn no_merge_base_nop_leaves_history_untouched() {
        let repo = FakeRepo::default();
        let local_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let local = repo.commit(local_tree, &[], "local root");
        let remote_tree = doc_tree(&repo, &[("z", json!({"_id": "z"}))]);
        let remote = repo.commit(remote_tree, &[], "remote root");
        let config = config(NoMergeBaseBehavior::Nop, false);

        let result = drive(&repo, LOCAL_REF, local, remote, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::Nop));
        assert_eq!(repo.push_count(), 0);
        assert_eq!(repo.resolve_ref(LOCAL_REF).unwrap(), None);
    }

    #[test]
    fn no_merge_base_accept_theirs_fast_forwards_onto_remote() {
        let repo = FakeRepo::default();
        let local_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let local = repo.commit(local_tree, &[], "local root");
        let remote_tree = doc_tree(&repo, &[("z", json!({"_id": "z"}))]);
        let remote = repo.commit(remote_tree, &[], "remote root");
        let config = config(NoMergeBaseBehavior::AcceptTheirs, true);

        let result = drive(&repo, LOCAL_REF, local, remote, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::FastForwardMerge));
        assert_eq!(repo.resolve_ref(LOCAL_REF).unwrap(), Some(remote));
        let commits = result.commits.unwrap();
        assert_eq!(commits.local, vec![repo.read_commit(remote).unwrap()]);
        assert!(commits.remote.is_empty());
    }

    #[test]
    fn no_merge_base_combine_joins_histories_without_pushing() {
        let repo = FakeRepo::default();
        let local_tree = doc_tree(&repo, &[("a", json!({"_id": "a"}))]);
        let local = repo.commit(local_tree, &[], "local root");
        let remote_tree = doc_tree(&repo, &[("z", json!({"_id": "z"}))]);
        let remote = repo.commit(remote_tree, &[], "remote root");
        let config = config(NoMergeBaseBehavior::Combine, true);

        let result = drive(&repo, LOCAL_REF, local, remote, &config, None, &CancelToken::new()).unwrap();

        assert_eq!(result.action, Some(SyncAction::CombineDatabaseWithTheirs));
        assert_eq!(repo.push_count(), 0);
        let new_head = repo.resolve_ref(LOCAL_REF).unwrap().unwrap();
        let commits = result.commits.unwrap();
        assert_eq!(commits.local, vec![repo.read_commit(new_head).unwrap()]);
        assert!(commits.remote.is_empty());
    }
}
