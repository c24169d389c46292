//! gix-backed ref resolution and ancestry operations.

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::objects_impl;
use crate::types::{CommitInfo, GitOid};

fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

fn from_gix_oid(oid: gix::ObjectId) -> GitOid {
    let bytes: [u8; 20] = oid.as_bytes().try_into().expect("SHA1 is 20 bytes");
    GitOid::from_bytes(bytes)
}

pub fn resolve_ref(repo: &GixRepo, name: &str) -> Result<Option<GitOid>, GitError> {
    match repo.repo.try_find_reference(name) {
        Ok(Some(mut r)) => {
            let id = r
                .peel_to_id_in_place()
                .map_err(|e| GitError::BackendError {
                    message: format!("failed to peel ref `{name}`: {e}"),
                })?;
            Ok(Some(from_gix_oid(id.detach())))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(GitError::BackendError {
            message: format!("failed to look up ref `{name}`: {e}"),
        }),
    }
}

pub fn update_ref(repo: &GixRepo, name: &str, oid: GitOid) -> Result<(), GitError> {
    use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};

    let edit = RefEdit {
        change: Change::Update {
            log: LogChange {
                mode: RefLog::AndReference,
                force_create_reflog: false,
                message: format!("gitdocdb: update {name}").into(),
            },
            expected: PreviousValue::Any,
            new: gix::refs::Target::Object(to_gix_oid(oid)),
        },
        name: name
            .try_into()
            .map_err(|e| GitError::BackendError {
                message: format!("invalid ref name `{name}`: {e}"),
            })?,
        deref: false,
    };

    repo.repo
        .edit_reference(edit)
        .map_err(|e| GitError::BackendError {
            message: format!("failed to update ref `{name}`: {e}"),
        })?;
    Ok(())
}

pub fn find_merge_base(
    repo: &GixRepo,
    a: GitOid,
    b: GitOid,
) -> Result<Option<GitOid>, GitError> {
    let a_id = to_gix_oid(a);
    let b_id = to_gix_oid(b);
    match repo.repo.merge_base(a_id, b_id) {
        Ok(base) => Ok(Some(from_gix_oid(base.detach()))),
        Err(gix::repository::merge_base::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(GitError::BackendError {
            message: format!("merge-base({a}, {b}) failed: {e}"),
        }),
    }
}

pub fn list_commits_between(
    repo: &GixRepo,
    old: Option<GitOid>,
    new: GitOid,
) -> Result<Vec<CommitInfo>, GitError> {
    let new_id = to_gix_oid(new);
    let mut walk: Vec<CommitInfo> = Vec::new();

    let ancestors = repo
        .repo
        .rev_walk([new_id])
        .all()
        .map_err(|e| GitError::BackendError {
            message: format!("failed to walk commits up to {new}: {e}"),
        })?;

    for info in ancestors {
        let info = info.map_err(|e| GitError::BackendError {
            message: format!("error while walking commit history: {e}"),
        })?;
        let commit_oid = from_gix_oid(info.id.detach());
        if Some(commit_oid) == old {
            break;
        }
        walk.push(objects_impl::read_commit(repo, commit_oid)?);
    }

    walk.reverse();
    Ok(walk)
}
