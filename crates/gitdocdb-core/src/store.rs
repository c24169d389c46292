//! Single-document reads and mutations against a git tree.
//!
//! Operations work directly against git objects rather than a filesystem
//! checkout: a document's path is derived from its `_id` and
//! [`SerializationMode`], a new blob is written for its body, and the tree
//! is rebuilt with that one path changed. The git object database is the
//! authoritative working tree; there is no separate filesystem checkout to
//! keep in sync.

use std::collections::BTreeMap;

use gitdocdb_git::{EntryMode, GitOid, GitRepo, TreeEntry};
use serde_json::Value;

use crate::error::CoreError;
use crate::format::{decode, encode};
use crate::model::{ChangeOperation, DocId, FatDoc, FatDocKind, SerializationMode};

/// The metadata directory prefix, excluded from document listings and
/// change reporting.
pub const METADATA_DIR: &str = ".gitddb";

/// The on-disk path for a document with this id under this serialization mode.
#[must_use]
pub fn doc_path(id: &DocId, mode: SerializationMode) -> String {
    format!("{id}.{}", mode.extension())
}

/// Build the [`FatDoc`] returned for a document read/written under `mode`.
/// `doc` is already the value [`decode`]/[`encode`] operate on for that mode
/// (a base64 string for [`SerializationMode::Binary`]).
fn fatdoc_for_mode(id: &DocId, file_oid: GitOid, doc: Value, mode: SerializationMode) -> FatDoc {
    let kind = if mode == SerializationMode::Binary {
        FatDocKind::Binary
    } else {
        FatDocKind::Json
    };
    FatDoc {
        id: id.clone(),
        name: doc_path(id, mode),
        kind,
        file_oid,
        doc,
    }
}

/// Read one document out of `tree`, or `None` if it is not present.
///
/// # Errors
/// Returns [`CoreError::InvalidJson`] if the stored bytes don't parse under `mode`.
pub fn get_document<R: GitRepo>(
    repo: &R,
    tree: GitOid,
    id: &DocId,
    mode: SerializationMode,
) -> Result<Option<FatDoc>, CoreError> {
    let path = doc_path(id, mode);
    let Some(oid) = find_blob(repo, tree, &path)? else {
        return Ok(None);
    };
    let bytes = repo.read_blob(oid)?;
    let doc = decode(&bytes, mode, &path)?;
    Ok(Some(fatdoc_for_mode(id, oid, doc, mode)))
}

/// The result of writing one document: the rebuilt tree plus enough to
/// build a commit message and a [`crate::model::ChangedFile`].
pub struct PutOutcome {
    /// The tree after this document's blob was inserted or replaced.
    pub tree: GitOid,
    /// Whether a document already lived at this path.
    pub operation: ChangeOperation,
    /// The document's identity and new content hash.
    pub doc: FatDoc,
}

/// Insert or replace one document's body, rebuilding `tree` with the one
/// changed path.
///
/// # Errors
/// Propagates [`CoreError::Git`] from tree read/write.
pub fn put_document<R: GitRepo>(
    repo: &R,
    tree: GitOid,
    id: &DocId,
    doc: &Value,
    mode: SerializationMode,
) -> Result<PutOutcome, CoreError> {
    let path = doc_path(id, mode);
    let bytes = encode(doc, mode);
    let oid = repo.write_blob(&bytes)?;

    let mut paths = list_paths(repo, tree)?;
    let operation = if paths.iter().any(|(p, _)| *p == path) {
        ChangeOperation::Update
    } else {
        ChangeOperation::Insert
    };
    paths.retain(|(p, _)| *p != path);
    paths.push((path, oid));

    let new_tree = write_tree_from_paths(repo, &paths)?;
    Ok(PutOutcome {
        tree: new_tree,
        operation,
        doc: fatdoc_for_mode(id, oid, doc.clone(), mode),
    })
}

/// The result of removing one document: the rebuilt tree plus the document
/// as it was before removal.
pub struct DeleteOutcome {
    /// The tree after this document's path was removed.
    pub tree: GitOid,
    /// The document as it existed before deletion.
    pub doc: FatDoc,
}

/// Remove one document, rebuilding `tree` without its path. Returns `None`
/// if no document existed at that id.
///
/// # Errors
/// Propagates [`CoreError::Git`] from tree read/write, or
/// [`CoreError::InvalidJson`] decoding the document being removed.
pub fn delete_document<R: GitRepo>(
    repo: &R,
    tree: GitOid,
    id: &DocId,
    mode: SerializationMode,
) -> Result<Option<DeleteOutcome>, CoreError> {
    let path = doc_path(id, mode);
    let Some(oid) = find_blob(repo, tree, &path)? else {
        return Ok(None);
    };
    let bytes = repo.read_blob(oid)?;
    let doc = decode(&bytes, mode, &path)?;
    let fatdoc = fatdoc_for_mode(id, oid, doc, mode);

    let mut paths = list_paths(repo, tree)?;
    paths.retain(|(p, _)| *p != path);
    let new_tree = write_tree_from_paths(repo, &paths)?;
    Ok(Some(DeleteOutcome {
        tree: new_tree,
        doc: fatdoc,
    }))
}

/// All blob paths under `tree`, skipping the metadata directory.
///
/// # Errors
/// Propagates [`CoreError::Git`] from the tree walk.
pub fn list_paths<R: GitRepo>(repo: &R, tree: GitOid) -> Result<Vec<(String, GitOid)>, CoreError> {
    Ok(repo
        .walk_tree(tree)?
        .into_iter()
        .filter(|(path, _)| !is_metadata_path(path))
        .collect())
}

/// Whether `path` falls under the reserved metadata directory.
#[must_use]
pub fn is_metadata_path(path: &str) -> bool {
    path == METADATA_DIR || path.starts_with(&format!("{METADATA_DIR}/"))
}

fn find_blob<R: GitRepo>(repo: &R, tree: GitOid, path: &str) -> Result<Option<GitOid>, CoreError> {
    for (p, oid) in repo.walk_tree(tree)? {
        if p == path {
            return Ok(Some(oid));
        }
    }
    Ok(None)
}

/// Rebuild a tree object from a flat list of (path, blob-oid) pairs,
/// reconstructing intermediate directories bottom-up.
///
/// # Errors
/// Propagates [`CoreError::Git`] from tree writes.
pub fn write_tree_from_paths<R: GitRepo>(
    repo: &R,
    paths: &[(String, GitOid)],
) -> Result<GitOid, CoreError> {
    let items: Vec<(Vec<String>, GitOid)> = paths
        .iter()
        .map(|(path, oid)| (path.split('/').map(str::to_owned).collect(), *oid))
        .collect();
    if items.is_empty() {
        return Ok(repo.write_tree(&[])?);
    }
    let entries = build_tree_entries(repo, &items)?;
    Ok(repo.write_tree(&entries)?)
}

fn build_tree_entries<R: GitRepo>(
    repo: &R,
    items: &[(Vec<String>, GitOid)],
) -> Result<Vec<TreeEntry>, CoreError> {
    let mut groups: BTreeMap<String, Vec<(Vec<String>, GitOid)>> = BTreeMap::new();
    for (segments, oid) in items {
        let (head, rest) = segments.split_first().expect("path has at least one segment");
        groups.entry(head.clone()).or_default().push((rest.to_vec(), *oid));
    }
    let mut entries = Vec::with_capacity(groups.len());
    for (name, children) in groups {
        if children.len() == 1 && children[0].0.is_empty() {
            entries.push(TreeEntry {
                name,
                mode: EntryMode::Blob,
                oid: children[0].1,
            });
        } else {
            let sub = build_tree_entries(repo, &children)?;
            let oid = repo.write_tree(&sub)?;
            entries.push(TreeEntry {
                name,
                mode: EntryMode::Tree,
                oid,
            });
        }
    }
    Ok(entries)
}

/// Build the commit message for a single-document mutation: the
/// `<verb>: <id><postfix>(<shortOid>)` grammar.
#[must_use]
pub fn commit_message(operation: ChangeOperation, id: &DocId, mode: SerializationMode, oid: GitOid) -> String {
    format!(
        "{}: {id}.{}({})",
        operation.verb(),
        mode.extension(),
        oid.short()
    )
}
