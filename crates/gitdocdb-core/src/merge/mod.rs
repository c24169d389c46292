//! The document merger and tree merger.

pub mod document;
pub mod tree;

pub use document::{merge_document, DocumentMergeOutcome, UserMergeFn, UserMergeOutcome};
pub use tree::{diff_tree, merge_trees, TreeMergeOutcome};

/// Conflict resolution policy for a single document.
///
/// [`Self::UserDefined`] is a bare tag here — the resolver function itself
/// is supplied out-of-band to [`merge_document`] via [`UserMergeFn`], since
/// a function pointer can't be carried by a `Copy`, comparable record like
/// [`crate::model::Conflict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Always take ours verbatim.
    Ours,
    /// Always take theirs verbatim.
    Theirs,
    /// Transform theirs against ours; ours wins overlapping fields.
    OursDiff,
    /// Transform ours against theirs; theirs wins overlapping fields.
    TheirsDiff,
    /// Defer to a user-supplied merge function.
    UserDefined,
}

impl ConflictStrategy {
    /// The configuration-option wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ours => "ours",
            Self::Theirs => "theirs",
            Self::OursDiff => "ours-diff",
            Self::TheirsDiff => "theirs-diff",
            Self::UserDefined => "user-defined",
        }
    }
}
