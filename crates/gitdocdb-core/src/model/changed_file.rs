//! [`ChangedFile`] — a single file-level change surfaced by a sync.

use super::fatdoc::FatDoc;

/// The kind of change a [`ChangedFile`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeOperation {
    /// A document was added.
    Insert,
    /// A document's body changed.
    Update,
    /// A document was removed.
    Delete,
}

impl ChangeOperation {
    /// The verb used in commit messages (commit message grammar).
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A single changed document, as reported in a [`crate::model::SyncResult`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChangedFile {
    /// What kind of change this is.
    pub operation: ChangeOperation,
    /// The document before the change. `None` for inserts.
    pub old: Option<FatDoc>,
    /// The document after the change. `None` for deletes.
    pub new: Option<FatDoc>,
}

impl ChangedFile {
    /// Construct an insert change.
    #[must_use]
    pub fn insert(new: FatDoc) -> Self {
        Self {
            operation: ChangeOperation::Insert,
            old: None,
            new: Some(new),
        }
    }

    /// Construct an update change.
    #[must_use]
    pub fn update(old: FatDoc, new: FatDoc) -> Self {
        Self {
            operation: ChangeOperation::Update,
            old: Some(old),
            new: Some(new),
        }
    }

    /// Construct a delete change.
    #[must_use]
    pub fn delete(old: FatDoc) -> Self {
        Self {
            operation: ChangeOperation::Delete,
            old: Some(old),
            new: None,
        }
    }
}
