//! The three-way tree merger.

use std::collections::BTreeMap;

use gitdocdb_git::{GitOid, GitRepo};
use serde_json::Value;

use crate::error::CoreError;
use crate::format;
use crate::model::{ChangeOperation, ChangedFile, Conflict, DocId, FatDoc, FatDocKind, SerializationMode};

use super::document::{merge_document, UserMergeFn};
use super::ConflictStrategy;

/// The metadata directory excluded from tree-merge walks.
const METADATA_DIR: &str = ".gitddb";

/// The result of merging three trees.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeMergeOutcome {
    /// The OID of the merged tree.
    pub tree_oid: GitOid,
    /// Changes that must be projected into the local working view to reach
    /// the merged tree.
    pub local_changes: Vec<ChangedFile>,
    /// Changes that must be projected into the remote's working view to
    /// reach the merged tree.
    pub remote_changes: Vec<ChangedFile>,
    /// Document-level conflicts recorded while merging (tree cases 4, 11).
    pub conflicts: Vec<Conflict>,
}

/// Merge `local` and `remote` trees against their common `base`, invoking
/// the document merger for paths that diverged on both sides.
///
/// # Errors
/// Propagates any [`GitError`](gitdocdb_git::GitError) from walking or
/// writing git objects, or [`CoreError::InvalidJson`] if a diverged
/// document's blob can't be parsed under `serialization`.
pub fn merge_trees<R: GitRepo>(
    repo: &R,
    base: Option<GitOid>,
    local: GitOid,
    remote: GitOid,
    strategy: ConflictStrategy,
    user_fn: Option<&UserMergeFn<'_>>,
    serialization: SerializationMode,
    key_of_unique_array: &[String],
) -> Result<TreeMergeOutcome, CoreError> {
    let base_map = walk(repo, base)?;
    let local_map = walk(repo, Some(local))?;
    let remote_map = walk(repo, Some(remote))?;

    let mut paths: Vec<&String> = base_map
        .keys()
        .chain(local_map.keys())
        .chain(remote_map.keys())
        .collect();
    paths.sort();
    paths.dedup();

    let mut final_entries: Vec<(String, GitOid)> = Vec::new();
    let mut local_changes = Vec::new();
    let mut remote_changes = Vec::new();
    let mut conflicts = Vec::new();

    for path in paths {
        let a = base_map.get(path).copied();
        let b = local_map.get(path).copied();
        let c = remote_map.get(path).copied();

        let resolution = classify(repo, path, a, b, c, strategy, user_fn, serialization, key_of_unique_array)?;

        if let Some(oid) = resolution.final_oid {
            final_entries.push((path.clone(), oid));
        }
        local_changes.extend(resolution.local_change);
        remote_changes.extend(resolution.remote_change);
        if let Some(conflict) = resolution.conflict {
            conflicts.push(conflict);
        }
    }

    let tree_oid = crate::store::write_tree_from_paths(repo, &final_entries)?;

    Ok(TreeMergeOutcome {
        tree_oid,
        local_changes,
        remote_changes,
        conflicts,
    })
}

struct Resolution {
    final_oid: Option<GitOid>,
    local_change: Option<ChangedFile>,
    remote_change: Option<ChangedFile>,
    conflict: Option<Conflict>,
}

fn no_change(oid: Option<GitOid>) -> Resolution {
    Resolution {
        final_oid: oid,
        local_change: None,
        remote_change: None,
        conflict: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn classify<R: GitRepo>(
    repo: &R,
    path: &str,
    a: Option<GitOid>,
    b: Option<GitOid>,
    c: Option<GitOid>,
    strategy: ConflictStrategy,
    user_fn: Option<&UserMergeFn<'_>>,
    serialization: SerializationMode,
    key_of_unique_array: &[String],
) -> Result<Resolution, CoreError> {
    match (a, b, c) {
        // Case 3/5/8: all agree (including "all absent", impossible since
        // path wouldn't be in the union).
        (_, x, y) if x == y && (a == x || a.is_none()) => Ok(no_change(x)),

        // Case 1: (-, -, X) accept remote add.
        (None, None, Some(c_oid)) => Ok(no_change(Some(c_oid))),

        // Case 2: (-, X, -) keep local add; remote must learn it.
        (None, Some(b_oid), None) => {
            let new = read_fatdoc(repo, path, b_oid, serialization)?;
            Ok(Resolution {
                final_oid: Some(b_oid),
                local_change: None,
                remote_change: Some(ChangedFile::insert(new)),
                conflict: None,
            })
        }

        // Case 4: (-, X, Y) both added differently -- doc merge, nil base.
        (None, Some(b_oid), Some(c_oid)) => {
            let ours = read_doc(repo, path, b_oid, serialization)?;
            let theirs = read_doc(repo, path, c_oid, serialization)?;
            let outcome = merge_document(None, &ours, &theirs, strategy, user_fn, key_of_unique_array);
            let merged_oid = write_doc(repo, &outcome.merged, serialization)?;
            let id = doc_id_from_path(path)?;

            let local_change = (merged_oid != b_oid)
                .then(|| ChangedFile::update(fatdoc(path, id.clone(), b_oid, &ours, serialization), fatdoc(path, id.clone(), merged_oid, &outcome.merged, serialization)));
            let remote_change = (merged_oid != c_oid)
                .then(|| ChangedFile::update(fatdoc(path, id.clone(), c_oid, &theirs, serialization), fatdoc(path, id.clone(), merged_oid, &outcome.merged, serialization)));

            Ok(Resolution {
                final_oid: Some(merged_oid),
                local_change,
                remote_change,
                conflict: Some(Conflict {
                    id,
                    strategy,
                    operation: ChangeOperation::Insert,
                }),
            })
        }

        // Case 6: (X, -, X) local deleted it, remote didn't -- accept the deletion.
        (Some(_), None, Some(c_oid)) => {
            let old = read_fatdoc(repo, path, c_oid, serialization)?;
            Ok(Resolution {
                final_oid: None,
                local_change: None,
                remote_change: Some(ChangedFile::delete(old)),
                conflict: None,
            })
        }

        // Case 7: (X, X, -) remote deleted it, local didn't -- accept the deletion.
        (Some(_), Some(b_oid), None) => {
            let old = read_fatdoc(repo, path, b_oid, serialization)?;
            Ok(Resolution {
                final_oid: None,
                local_change: Some(ChangedFile::delete(old)),
                remote_change: None,
                conflict: None,
            })
        }

        // Case 9: (X, Y, X) local updated; remote is still at base.
        (Some(a_oid), Some(b_oid), Some(_)) if b_oid != a_oid => {
            let old = read_fatdoc(repo, path, a_oid, serialization)?;
            let new = read_fatdoc(repo, path, b_oid, serialization)?;
            Ok(Resolution {
                final_oid: Some(b_oid),
                local_change: None,
                remote_change: Some(ChangedFile::update(old, new)),
                conflict: None,
            })
        }

        // Case 10: (X, X, Y) remote updated; local is still at base.
        (Some(a_oid), Some(_), Some(c_oid)) => {
            let old = read_fatdoc(repo, path, a_oid, serialization)?;
            let new = read_fatdoc(repo, path, c_oid, serialization)?;
            Ok(Resolution {
                final_oid: Some(c_oid),
                local_change: Some(ChangedFile::update(old, new)),
                remote_change: None,
                conflict: None,
            })
        }

        // Everything else with a base present is case 11: all three diverged.
        (Some(a_oid), Some(b_oid), Some(c_oid)) => {
            let base_doc = read_doc(repo, path, a_oid, serialization)?;
            let ours = read_doc(repo, path, b_oid, serialization)?;
            let theirs = read_doc(repo, path, c_oid, serialization)?;
            let outcome = merge_document(Some(&base_doc), &ours, &theirs, strategy, user_fn, key_of_unique_array);
            let merged_oid = write_doc(repo, &outcome.merged, serialization)?;
            let id = doc_id_from_path(path)?;

            let local_change = (merged_oid != b_oid)
                .then(|| ChangedFile::update(fatdoc(path, id.clone(), b_oid, &ours, serialization), fatdoc(path, id.clone(), merged_oid, &outcome.merged, serialization)));
            let remote_change = (merged_oid != c_oid)
                .then(|| ChangedFile::update(fatdoc(path, id.clone(), c_oid, &theirs, serialization), fatdoc(path, id.clone(), merged_oid, &outcome.merged, serialization)));

            Ok(Resolution {
                final_oid: Some(merged_oid),
                local_change,
                remote_change,
                conflict: Some(Conflict {
                    id,
                    strategy,
                    operation: ChangeOperation::Update,
                }),
            })
        }

        // Case 8 and the fully-absent case: nothing to do.
        (Some(_), None, None) | (None, None, None) => Ok(no_change(None)),
    }
}

/// A plain two-way tree diff (no merging): every path that differs between
/// `old` and `new` becomes an insert, update, or delete. Used by the sync
/// engine for push/fast-forward cycles, where one side is simply advancing
/// to the other's exact tree and no three-way merge is needed.
///
/// # Errors
/// Propagates git object read failures or undecodable document bodies.
pub fn diff_tree<R: GitRepo>(
    repo: &R,
    old: Option<GitOid>,
    new: Option<GitOid>,
    serialization: SerializationMode,
) -> Result<Vec<ChangedFile>, CoreError> {
    let old_map = walk(repo, old)?;
    let new_map = walk(repo, new)?;

    let mut paths: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
    paths.sort();
    paths.dedup();

    let mut changes = Vec::new();
    for path in paths {
        match (old_map.get(path), new_map.get(path)) {
            (Some(o), Some(n)) if o == n => {}
            (Some(o), Some(n)) => {
                let old_doc = read_fatdoc(repo, path, *o, serialization)?;
                let new_doc = read_fatdoc(repo, path, *n, serialization)?;
                changes.push(ChangedFile::update(old_doc, new_doc));
            }
            (None, Some(n)) => changes.push(ChangedFile::insert(read_fatdoc(repo, path, *n, serialization)?)),
            (Some(o), None) => changes.push(ChangedFile::delete(read_fatdoc(repo, path, *o, serialization)?)),
            (None, None) => unreachable!("path came from one of the two maps"),
        }
    }
    Ok(changes)
}

fn walk<R: GitRepo>(repo: &R, tree: Option<GitOid>) -> Result<BTreeMap<String, GitOid>, CoreError> {
    let Some(tree) = tree else {
        return Ok(BTreeMap::new());
    };
    Ok(repo
        .walk_tree(tree)?
        .into_iter()
        .filter(|(path, _)| !path.starts_with(METADATA_DIR))
        .collect())
}

fn read_doc<R: GitRepo>(repo: &R, path: &str, oid: GitOid, mode: SerializationMode) -> Result<Value, CoreError> {
    let bytes = repo.read_blob(oid)?;
    format::decode(&bytes, mode, path)
}

fn write_doc<R: GitRepo>(repo: &R, doc: &Value, mode: SerializationMode) -> Result<GitOid, CoreError> {
    let bytes = format::encode(doc, mode);
    Ok(repo.write_blob(&bytes)?)
}

fn read_fatdoc<R: GitRepo>(repo: &R, path: &str, oid: GitOid, mode: SerializationMode) -> Result<FatDoc, CoreError> {
    let doc = read_doc(repo, path, oid, mode)?;
    let id = doc_id_from_path(path)?;
    Ok(fatdoc(path, id, oid, &doc, mode))
}

fn fatdoc(path: &str, id: DocId, oid: GitOid, doc: &Value, mode: SerializationMode) -> FatDoc {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    let kind = if mode == SerializationMode::Binary {
        FatDocKind::Binary
    } else {
        FatDocKind::Json
    };
    FatDoc {
        id,
        name,
        kind,
        file_oid: oid,
        doc: doc.clone(),
    }
}

fn doc_id_from_path(path: &str) -> Result<DocId, CoreError> {
    let stem = path.rsplit_once('.').map_or(path, |(stem, _)| stem);
    DocId::new(stem).map_err(|e| CoreError::InvalidId {
        id: path.to_string(),
        reason: e.reason,
    })
}

