//! The gix-backed implementation of [`GitRepo`].

use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::repo::GitRepo;
use crate::types::{Author, CommitInfo, Credentials, GitOid, TreeEntry};

/// A [`GitRepo`] implementation backed by [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixRepo::open`] or [`GixRepo::init`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
    pub(crate) workdir: Option<PathBuf>,
}

impl GixRepo {
    /// Open the git repository at or above `path`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open(path).map_err(|e| GitError::BackendError { message: e.to_string() })?;
        let workdir = repo.workdir().map(std::path::Path::to_path_buf);
        Ok(Self { repo, workdir })
    }

    /// Initialize a new repository at `path` and open it.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let repo =
            gix::init(path).map_err(|e| GitError::BackendError { message: e.to_string() })?;
        let workdir = repo.workdir().map(std::path::Path::to_path_buf);
        Ok(Self { repo, workdir })
    }

    /// Clone `remote_url` into `path` and open the result.
    pub fn clone(
        remote_url: &str,
        path: &Path,
        credentials: &Credentials,
    ) -> Result<Self, GitError> {
        let _ = credentials;
        let mut prepare = gix::prepare_clone(remote_url, path)
            .map_err(|e| GitError::BackendError { message: e.to_string() })?;
        let (mut checkout, _) = prepare
            .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
            .map_err(|e| GitError::BackendError { message: e.to_string() })?;
        let (repo, _) = checkout
            .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
            .map_err(|e| GitError::BackendError { message: e.to_string() })?;
        let workdir = repo.workdir().map(std::path::Path::to_path_buf);
        Ok(Self { repo, workdir })
    }

    /// The repository's working directory, if it has one (bare repos don't).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }
}

impl GitRepo for GixRepo {
    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        crate::objects_impl::read_commit(self, oid)
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        crate::objects_impl::read_tree(self, oid)
    }

    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        crate::objects_impl::read_blob(self, oid)
    }

    fn hash_blob(&self, data: &[u8]) -> GitOid {
        crate::objects_impl::hash_blob(data)
    }

    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_blob(self, data)
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_tree(self, entries)
    }

    fn write_commit(
        &self,
        tree: GitOid,
        parents: &[GitOid],
        author: &Author,
        committer: &Author,
        message: &str,
    ) -> Result<GitOid, GitError> {
        crate::objects_impl::write_commit(self, tree, parents, author, committer, message)
    }

    fn resolve_ref(&self, name: &str) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::resolve_ref(self, name)
    }

    fn update_ref(&self, name: &str, oid: GitOid) -> Result<(), GitError> {
        crate::refs_impl::update_ref(self, name, oid)
    }

    fn find_merge_base(&self, a: GitOid, b: GitOid) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::find_merge_base(self, a, b)
    }

    fn list_commits_between(
        &self,
        old: Option<GitOid>,
        new: GitOid,
    ) -> Result<Vec<CommitInfo>, GitError> {
        crate::refs_impl::list_commits_between(self, old, new)
    }

    fn fetch(
        &self,
        remote_url: &str,
        branch: &str,
        credentials: &Credentials,
    ) -> Result<GitOid, GitError> {
        crate::transport_impl::fetch(self, remote_url, branch, credentials)
    }

    fn push(
        &self,
        remote_url: &str,
        branch: &str,
        credentials: &Credentials,
        force: bool,
    ) -> Result<(), GitError> {
        crate::transport_impl::push(self, remote_url, branch, credentials, force)
    }
}
