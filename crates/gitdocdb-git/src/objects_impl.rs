//! gix-backed object read/write operations.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::types::{Author, CommitInfo, EntryMode, GitOid, TreeEntry};

fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

fn from_gix_oid(oid: gix::ObjectId) -> GitOid {
    let bytes: [u8; 20] = oid.as_bytes().try_into().expect("SHA1 is 20 bytes");
    GitOid::from_bytes(bytes)
}

fn from_gix_entry_mode(mode: gix::objs::tree::EntryMode) -> EntryMode {
    match mode.kind() {
        gix::objs::tree::EntryKind::Tree => EntryMode::Tree,
        gix::objs::tree::EntryKind::Blob => EntryMode::Blob,
        gix::objs::tree::EntryKind::BlobExecutable => EntryMode::BlobExecutable,
        gix::objs::tree::EntryKind::Link => EntryMode::Link,
        gix::objs::tree::EntryKind::Commit => EntryMode::Blob,
    }
}

fn to_gix_entry_kind(mode: EntryMode) -> gix::objs::tree::EntryKind {
    match mode {
        EntryMode::Blob => gix::objs::tree::EntryKind::Blob,
        EntryMode::BlobExecutable => gix::objs::tree::EntryKind::BlobExecutable,
        EntryMode::Tree => gix::objs::tree::EntryKind::Tree,
        EntryMode::Link => gix::objs::tree::EntryKind::Link,
    }
}

fn from_gix_signature(sig: gix::actor::SignatureRef<'_>) -> Author {
    Author {
        name: sig.name.to_string(),
        email: sig.email.to_string(),
        timestamp: sig.time().unwrap_or_default().seconds,
    }
}

fn to_gix_time(timestamp: i64) -> gix::date::Time {
    gix::date::Time::new(timestamp, 0)
}

pub fn read_blob(repo: &GixRepo, oid: GitOid) -> Result<Vec<u8>, GitError> {
    let gix_oid = to_gix_oid(oid);
    let mut blob = repo
        .repo
        .find_blob(gix_oid)
        .map_err(|e| GitError::NotFound {
            message: format!("blob {oid}: {e}"),
        })?;
    Ok(blob.take_data())
}

pub fn read_tree(repo: &GixRepo, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
    let gix_oid = to_gix_oid(oid);
    let tree = repo
        .repo
        .find_tree(gix_oid)
        .map_err(|e| GitError::NotFound {
            message: format!("tree {oid}: {e}"),
        })?;

    let mut entries = Vec::new();
    for result in tree.iter() {
        let entry = result.map_err(|e| GitError::BackendError {
            message: format!("failed to decode tree entry: {e}"),
        })?;
        let oid_bytes: [u8; 20] = entry
            .inner
            .oid
            .as_bytes()
            .try_into()
            .expect("SHA1 is 20 bytes");
        entries.push(TreeEntry {
            name: entry.inner.filename.to_string(),
            mode: from_gix_entry_mode(entry.inner.mode),
            oid: GitOid::from_bytes(oid_bytes),
        });
    }
    Ok(entries)
}

pub fn read_commit(repo: &GixRepo, oid: GitOid) -> Result<CommitInfo, GitError> {
    let gix_oid = to_gix_oid(oid);
    let commit = repo
        .repo
        .find_commit(gix_oid)
        .map_err(|e| GitError::NotFound {
            message: format!("commit {oid}: {e}"),
        })?;

    let decoded = commit.decode().map_err(|e| GitError::BackendError {
        message: format!("failed to decode commit {oid}: {e}"),
    })?;

    Ok(CommitInfo {
        oid,
        tree_oid: from_gix_oid(decoded.tree()),
        parents: decoded.parents().map(from_gix_oid).collect(),
        message: decoded.message.to_string(),
        author: from_gix_signature(decoded.author()),
        committer: from_gix_signature(decoded.committer()),
    })
}

pub fn hash_blob(data: &[u8]) -> GitOid {
    // SHA-1 of the canonical git blob header plus content, matching
    // `git hash-object` without `-w`.
    use gix::objs::WriteTo as _;
    let blob = gix::objs::BlobRef { data };
    let mut buf = Vec::new();
    blob.write_to(&mut buf).expect("writing to a Vec cannot fail");
    let mut hasher = gix::hash::hasher(gix::hash::Kind::Sha1);
    hasher.update(&buf);
    from_gix_oid(hasher.try_finalize().expect("sha1 digest is always available"))
}

pub fn write_blob(repo: &GixRepo, data: &[u8]) -> Result<GitOid, GitError> {
    let id = repo
        .repo
        .write_blob(data)
        .map_err(|e| GitError::BackendError {
            message: format!("failed to write blob: {e}"),
        })?;
    Ok(from_gix_oid(id.detach()))
}

pub fn write_tree(repo: &GixRepo, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
    let mut tree = gix::objs::Tree {
        entries: entries
            .iter()
            .map(|e| gix::objs::tree::Entry {
                mode: to_gix_entry_kind(e.mode).into(),
                filename: e.name.as_str().into(),
                oid: to_gix_oid(e.oid),
            })
            .collect(),
    };
    tree.entries.sort();
    let id = repo
        .repo
        .write_object(&tree)
        .map_err(|e| GitError::BackendError {
            message: format!("failed to write tree: {e}"),
        })?;
    Ok(from_gix_oid(id.detach()))
}

pub fn write_commit(
    repo: &GixRepo,
    tree: GitOid,
    parents: &[GitOid],
    author: &Author,
    committer: &Author,
    message: &str,
) -> Result<GitOid, GitError> {
    let commit = gix::objs::Commit {
        message: message.into(),
        tree: to_gix_oid(tree),
        author: gix::actor::Signature {
            name: author.name.as_str().into(),
            email: author.email.as_str().into(),
            time: to_gix_time(author.timestamp),
        },
        committer: gix::actor::Signature {
            name: committer.name.as_str().into(),
            email: committer.email.as_str().into(),
            time: to_gix_time(committer.timestamp),
        },
        encoding: None,
        parents: parents.iter().map(|p| to_gix_oid(*p)).collect(),
        extra_headers: Vec::new(),
    };
    let id = repo
        .repo
        .write_object(&commit)
        .map_err(|e| GitError::BackendError {
            message: format!("failed to write commit object: {e}"),
        })?;
    Ok(from_gix_oid(id.detach()))
}

/// Current wall-clock time as seconds since the Unix epoch, used when the
/// caller does not supply an explicit timestamp (tests always do, for
/// determinism).
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
