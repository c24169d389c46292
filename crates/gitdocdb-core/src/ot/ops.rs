//! The JSON OT algebra.

use serde_json::Value;

use crate::diff::TextHunk;

/// A single step of a [`Path`]: an object key or an array index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

/// A path into a JSON document: a list of object keys and/or array indices.
pub type Path = Vec<PathSegment>;

/// Render a path as its JSON-encoded prefix string, used to compare
/// conflicting paths during transform.
#[must_use]
pub fn path_key(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for seg in path {
        match seg {
            PathSegment::Key(k) => {
                out.push('/');
                out.push_str(k);
            }
            PathSegment::Index(i) => {
                out.push('/');
                out.push_str(&i.to_string());
            }
        }
    }
    out
}

/// `true` if `a` and `b` address overlapping parts of the document — equal
/// paths, or one a strict prefix of the other.
#[must_use]
pub fn paths_conflict(a: &[PathSegment], b: &[PathSegment]) -> bool {
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

/// One atomic operation in the JSON OT algebra.
#[derive(Clone, Debug, PartialEq)]
pub enum OtOp {
    /// Place a new value at `path` (object key or array index).
    Insert {
        /// Target location.
        path: Path,
        /// The value to insert.
        value: Value,
    },
    /// Delete the value at `path`.
    Remove {
        /// Target location.
        path: Path,
        /// The value being removed (carried for conflict diagnostics and
        /// for undo, not required to apply).
        old: Value,
    },
    /// Supersede the value at `path`.
    Replace {
        /// Target location.
        path: Path,
        /// The value being replaced.
        old: Value,
        /// The new value.
        new: Value,
    },
    /// Relocate an array element from one path to another.
    Move {
        /// Original location.
        from: Path,
        /// Destination location.
        to: Path,
        /// The value being relocated (for conflict diagnostics).
        value: Value,
    },
    /// Apply a sequence of code-point-addressed text hunks to the string at
    /// `path`.
    EditText {
        /// Target location (must address a JSON string).
        path: Path,
        /// The hunks to apply, in order.
        hunks: Vec<TextHunk>,
    },
}

impl OtOp {
    /// The path this operation is primarily addressed at — `from` for
    /// [`OtOp::Move`], since that is where the conflict-relevant identity
    /// of the source element lives.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        match self {
            Self::Insert { path, .. }
            | Self::Remove { path, .. }
            | Self::Replace { path, .. }
            | Self::EditText { path, .. } => path,
            Self::Move { from, .. } => from,
        }
    }
}

/// A composed sequence of [`OtOp`]s, applied in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeOp(pub Vec<OtOp>);

impl CompositeOp {
    /// An empty (no-op) composite operation.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// `true` if this operation has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of atomic steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
