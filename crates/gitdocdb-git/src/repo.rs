//! The [`GitRepo`] trait — the single abstraction boundary between gitdocdb
//! and git.
//!
//! Every other gitdocdb crate interacts with git exclusively through this
//! trait; no other crate imports `gix` directly. The surface is exactly the
//! primitive set the sync engine and tree/document mergers need: object
//! read/write, ref resolution, ancestry, and remote transport.
//!
//! | Group        | Methods                                                  |
//! |--------------|-----------------------------------------------------------|
//! | Object read  | `read_commit`, `read_tree`, `read_blob`                  |
//! | Object write | `hash_blob`, `write_blob`, `write_tree`, `write_commit`  |
//! | Refs         | `resolve_ref`, `update_ref`                              |
//! | Ancestry     | `find_merge_base`, `list_commits_between`                |
//! | Transport    | `fetch`, `push`                                          |

use crate::error::GitError;
use crate::types::{Author, CommitInfo, Credentials, GitOid, TreeEntry};

/// The git abstraction trait used by all gitdocdb crates.
///
/// Implementations may be backed by gix (the preferred backend, see
/// [`GixRepo`](crate::GixRepo)) or a test double.
///
/// # Object safety
///
/// This trait is object-safe: no generic methods, no `Self` in return
/// position outside of `Result`. Callers may use `&dyn GitRepo`.
pub trait GitRepo {
    // -----------------------------------------------------------------------
    // Object read
    // -----------------------------------------------------------------------

    /// Read a commit object's metadata.
    ///
    /// Replaces: `git cat-file commit <oid>`.
    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError>;

    /// Read the entries of a tree object, one level deep (not recursive).
    ///
    /// Replaces: `git ls-tree <oid>`.
    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError>;

    /// Read the contents of a blob object.
    ///
    /// Replaces: `git cat-file blob <oid>`.
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError>;

    // -----------------------------------------------------------------------
    // Object write
    // -----------------------------------------------------------------------

    /// Compute the OID a blob with this content would have, without writing
    /// it to the object store.
    ///
    /// Replaces: `git hash-object --stdin` (without `-w`).
    fn hash_blob(&self, data: &[u8]) -> GitOid;

    /// Write a blob to the object store and return its OID.
    ///
    /// Replaces: `git hash-object -w --stdin`.
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError>;

    /// Write a tree object from a list of entries and return its OID.
    ///
    /// Replaces: `git mktree`.
    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError>;

    /// Create a commit object and return its OID. Does not move any ref;
    /// callers update refs explicitly via [`update_ref`](Self::update_ref).
    ///
    /// Replaces: `git commit-tree <tree> -p <parent>... -m <message>`.
    fn write_commit(
        &self,
        tree: GitOid,
        parents: &[GitOid],
        author: &Author,
        committer: &Author,
        message: &str,
    ) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------------

    /// Resolve a ref to its OID, returning `None` if the ref does not exist.
    ///
    /// Replaces: `git rev-parse <ref>`.
    fn resolve_ref(&self, name: &str) -> Result<Option<GitOid>, GitError>;

    /// Create or overwrite a ref unconditionally.
    ///
    /// Replaces: `git update-ref <name> <oid>`.
    fn update_ref(&self, name: &str, oid: GitOid) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Ancestry
    // -----------------------------------------------------------------------

    /// Find the best common ancestor (merge base) of two commits.
    ///
    /// Returns `None` if the commits have no common ancestor.
    ///
    /// Replaces: `git merge-base <a> <b>`.
    fn find_merge_base(&self, a: GitOid, b: GitOid) -> Result<Option<GitOid>, GitError>;

    /// List commits reachable from `new` but not from `old`, oldest first.
    /// The `old` endpoint itself is excluded; `new` is included.
    ///
    /// Replaces: `git log --reverse <old>..<new>`.
    fn list_commits_between(
        &self,
        old: Option<GitOid>,
        new: GitOid,
    ) -> Result<Vec<CommitInfo>, GitError>;

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// Fetch `branch` from `remote_url` and return the OID it points to on
    /// the remote. Does not move any local ref.
    ///
    /// Replaces: `git fetch <remote> <branch>` followed by reading `FETCH_HEAD`.
    fn fetch(
        &self,
        remote_url: &str,
        branch: &str,
        credentials: &Credentials,
    ) -> Result<GitOid, GitError>;

    /// Push the local `branch` ref to `remote_url`.
    ///
    /// Replaces: `git push <remote> <branch>` (or `--force`).
    fn push(
        &self,
        remote_url: &str,
        branch: &str,
        credentials: &Credentials,
        force: bool,
    ) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Provided methods
    // -----------------------------------------------------------------------

    /// Recursively walk a tree, yielding every blob path relative to the
    /// tree root together with its OID.
    ///
    /// Default implementation built entirely on [`read_tree`](Self::read_tree);
    /// backends never need to override it.
    fn walk_tree(&self, root: GitOid) -> Result<Vec<(String, GitOid)>, GitError>
    where
        Self: Sized,
    {
        let mut out = Vec::new();
        walk_tree_into(self, root, String::new(), &mut out)?;
        Ok(out)
    }
}

fn walk_tree_into<R: GitRepo + ?Sized>(
    repo: &R,
    tree_oid: GitOid,
    prefix: String,
    out: &mut Vec<(String, GitOid)>,
) -> Result<(), GitError> {
    use crate::types::EntryMode;

    for entry in repo.read_tree(tree_oid)? {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        match entry.mode {
            EntryMode::Tree => walk_tree_into(repo, entry.oid, path, out)?,
            EntryMode::Blob | EntryMode::BlobExecutable | EntryMode::Link => {
                out.push((path, entry.oid));
            }
        }
    }
    Ok(())
}
