//! The three-way document merger.

use serde_json::Value;

use crate::diff::{diff, DiffOptions};
use crate::model::ChangeOperation;
use crate::ot::{apply, from_diff, transform, Winner};

use super::ConflictStrategy;

/// What a user-supplied merge function returns.
#[derive(Clone, Debug, PartialEq)]
pub enum UserMergeOutcome {
    /// The caller resolved the conflict; use this document.
    Merged(Value),
    /// The caller declined; escalate (surface as an unresolved conflict).
    Escalate,
}

/// A user-supplied merge function: `(base, ours, theirs) -> outcome`.
pub type UserMergeFn<'a> = dyn Fn(Option<&Value>, &Value, &Value) -> UserMergeOutcome + 'a;

/// The result of merging one document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentMergeOutcome {
    /// The merged body.
    pub merged: Value,
    /// Whether the two sides disagreed at at least one overlapping path.
    pub had_conflict: bool,
    /// Insert/update/delete, derived from whether `base` existed.
    pub operation: ChangeOperation,
}

/// Merge `ours` and `theirs` against their common `base` under `strategy`.
///
/// `user_fn` is consulted only when `strategy` is
/// [`ConflictStrategy::UserDefined`]; it is ignored otherwise.
#[must_use]
pub fn merge_document(
    base: Option<&Value>,
    ours: &Value,
    theirs: &Value,
    strategy: ConflictStrategy,
    user_fn: Option<&UserMergeFn<'_>>,
    key_of_unique_array: &[String],
) -> DocumentMergeOutcome {
    let operation = if base.is_none() {
        ChangeOperation::Insert
    } else {
        ChangeOperation::Update
    };

    let (mut merged, had_conflict) = match strategy {
        ConflictStrategy::Ours => (ours.clone(), ours != theirs),
        ConflictStrategy::Theirs => (theirs.clone(), ours != theirs),
        ConflictStrategy::OursDiff => diff_merge(base, ours, theirs, Winner::Ours),
        ConflictStrategy::TheirsDiff => diff_merge(base, ours, theirs, Winner::Theirs),
        ConflictStrategy::UserDefined => match user_fn.map(|f| f(base, ours, theirs)) {
            Some(UserMergeOutcome::Merged(doc)) => (doc, false),
            Some(UserMergeOutcome::Escalate) | None => diff_merge(base, ours, theirs, Winner::Ours),
        },
    };

    dedup_unique_arrays(&mut merged, key_of_unique_array);

    DocumentMergeOutcome {
        merged,
        had_conflict,
        operation,
    }
}

/// `ours-diff`/`theirs-diff`: diff each side against `base`, transform one
/// op against the other so the winner keeps every op and the loser keeps
/// only its non-overlapping ops, then apply the combined op to `base`.
fn diff_merge(base: Option<&Value>, ours: &Value, theirs: &Value, winner: Winner) -> (Value, bool) {
    let base_doc = base.cloned().unwrap_or(Value::Null);
    let opts = DiffOptions::default();
    let op_ours = diff(&base_doc, ours, opts).map(|d| from_diff(&d)).unwrap_or_default();
    let op_theirs = diff(&base_doc, theirs, opts).map(|d| from_diff(&d)).unwrap_or_default();
    let conflict = crate::ot::has_conflict(&op_ours, &op_theirs);
    let combined = transform(&op_ours, &op_theirs, winner);
    (apply(&base_doc, &combined), conflict)
}

/// For each field named in `keys`, if it holds an array, drop later
/// duplicate elements (by deep equality), keeping the first occurrence.
fn dedup_unique_arrays(doc: &mut Value, keys: &[String]) {
    let Some(map) = doc.as_object_mut() else {
        return;
    };
    for key in keys {
        let Some(Value::Array(items)) = map.get_mut(key) else {
            continue;
        };
        let mut seen: Vec<Value> = Vec::with_capacity(items.len());
        items.retain(|item| {
            if seen.contains(item) {
                false
            } else {
                seen.push(item.clone());
                true
            }
        });
    }
}
