//! [`FatDoc`] — document plus identity metadata.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use gitdocdb_git::GitOid;
use serde_json::Value;

use super::doc_id::DocId;

/// What kind of content a [`FatDoc`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FatDocKind {
    /// A parsed JSON document.
    Json,
    /// Text content that is not JSON (e.g., the markdown body of a
    /// front-matter document).
    Text,
    /// Opaque binary content.
    Binary,
}

/// A document together with its storage-layer identity.
///
/// `name` (the full filename, including postfix) is canonical at the
/// storage layer; `_id` is canonical at the API layer.
#[derive(Clone, Debug, PartialEq)]
pub struct FatDoc {
    /// The document's `_id`.
    pub id: DocId,
    /// Full filename, including serialization postfix.
    pub name: String,
    /// What kind of content this is.
    pub kind: FatDocKind,
    /// Content hash of the on-disk file.
    pub file_oid: GitOid,
    /// Parsed body. For [`FatDocKind::Json`] this is the full document; for
    /// [`FatDocKind::Text`] a bare `Value::String` of its text; for
    /// [`FatDocKind::Binary`] a `Value::String` holding the blob's base64
    /// encoding (see [`Self::binary`] and [`crate::format::decode`]).
    pub doc: Value,
}

impl FatDoc {
    /// Build a JSON `FatDoc`, deriving `name` from `id` and the given
    /// serialization postfix.
    #[must_use]
    pub fn json(id: DocId, file_oid: GitOid, doc: Value, extension: &str) -> Self {
        let name = format!("{id}.{extension}");
        Self {
            id,
            name,
            kind: FatDocKind::Json,
            file_oid,
            doc,
        }
    }

    /// Build a plain-text `FatDoc`, deriving `name` from `id` and the given
    /// serialization postfix.
    #[must_use]
    pub fn text(id: DocId, file_oid: GitOid, text: impl Into<String>, extension: &str) -> Self {
        let name = format!("{id}.{extension}");
        Self {
            id,
            name,
            kind: FatDocKind::Text,
            file_oid,
            doc: Value::String(text.into()),
        }
    }

    /// Build a binary `FatDoc` from a raw blob, base64-encoding it into
    /// `doc` opaquely; deriving `name` from `id` and the given extension.
    #[must_use]
    pub fn binary(id: DocId, file_oid: GitOid, blob: &[u8], extension: &str) -> Self {
        let name = format!("{id}.{extension}");
        Self {
            id,
            name,
            kind: FatDocKind::Binary,
            file_oid,
            doc: Value::String(BASE64.encode(blob)),
        }
    }
}
