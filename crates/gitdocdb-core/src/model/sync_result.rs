//! [`SyncResult`] and friends — the typed outcome of a sync cycle.

use gitdocdb_git::CommitInfo;

use super::changed_file::{ChangeOperation, ChangedFile};
use super::doc_id::DocId;

/// A normalized view of a git commit (`Commit`).
pub type Commit = CommitInfo;

/// The category of outcome a sync cycle produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Local and remote HEAD already matched.
    Nop,
    /// Local was ahead; pushed without merging.
    Push,
    /// Remote was ahead; local ref fast-forwarded.
    FastForwardMerge,
    /// Both sides advanced independently with no content conflicts; merged and pushed.
    MergeAndPush,
    /// Both sides advanced with content conflicts; conflicts resolved, merged, and pushed.
    ResolveConflictsAndPush,
    /// No merge base existed; histories were combined (bootstrap only).
    CombineDatabaseWithTheirs,
    /// The sync was canceled before completion.
    Canceled,
}

impl SyncAction {
    /// The human-readable action string used in [`SyncResult`]'s wire shape.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Push => "push",
            Self::FastForwardMerge => "fast-forward merge",
            Self::MergeAndPush => "merge and push",
            Self::ResolveConflictsAndPush => "resolve conflicts and push",
            Self::CombineDatabaseWithTheirs => "combine database with theirs",
            Self::Canceled => "canceled",
        }
    }
}

/// Commits made on each side during a sync, present when `includeCommits` is set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SideCommits {
    /// Commits local gained.
    pub local: Vec<Commit>,
    /// Commits remote gained (as observed locally after fetch).
    pub remote: Vec<Commit>,
}

/// Document-level changes on each side during a sync.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SideChanges {
    /// Changes applied to the local working tree.
    pub local: Vec<ChangedFile>,
    /// Changes the remote side gained.
    pub remote: Vec<ChangedFile>,
}

/// A single resolved conflict, recorded when `action` is
/// [`SyncAction::ResolveConflictsAndPush`].
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    /// The conflicting document's id.
    pub id: DocId,
    /// The resolution strategy applied.
    pub strategy: crate::merge::ConflictStrategy,
    /// Whether the conflicting document was inserted, updated, or deleted.
    pub operation: ChangeOperation,
}

/// The typed outcome of one sync cycle (wire shape).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncResult {
    /// The classified action (defaults to [`SyncAction::Nop`]).
    pub action: Option<SyncAction>,
    /// Commit lists, present when requested via `includeCommits`.
    pub commits: Option<SideCommits>,
    /// Document changes on each side.
    pub changes: SideChanges,
    /// Resolved conflicts, present only for [`SyncAction::ResolveConflictsAndPush`].
    pub conflicts: Option<Vec<Conflict>>,
}

impl SyncResult {
    /// The empty result for a [`SyncAction::Nop`] sync.
    #[must_use]
    pub fn nop() -> Self {
        Self {
            action: Some(SyncAction::Nop),
            ..Self::default()
        }
    }

    /// The result for a canceled sync.
    #[must_use]
    pub fn canceled() -> Self {
        Self {
            action: Some(SyncAction::Canceled),
            ..Self::default()
        }
    }
}
