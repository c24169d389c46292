//! `transform(opOurs, opTheirs, strategy) -> opToApply`.
//!
//! Transform never raises: a path touched by both sides is a conflict,
//! resolved by dropping the losing side's op at that path rather than by
//! erroring. Which side loses is controlled by the merge strategy supplied
//! by the caller (the document merger).

use super::ops::{paths_conflict, CompositeOp, OtOp};

/// Which side's conflicting ops survive a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winner {
    /// Ours wins: conflicting ops are stripped from `theirs`.
    Ours,
    /// Theirs wins: conflicting ops are stripped from `ours`.
    Theirs,
}

/// Transform `ours` against `theirs`, stripping whichever side's op loses
/// at each conflicting path, and return the two survivors composed in
/// sequence (`winner` first to keep the wire order stable).
#[must_use]
pub fn transform(ours: &CompositeOp, theirs: &CompositeOp, winner: Winner) -> CompositeOp {
    let (kept_ours, kept_theirs) = match winner {
        Winner::Ours => (ours.0.clone(), strip_conflicting(theirs, ours)),
        Winner::Theirs => (strip_conflicting(ours, theirs), theirs.0.clone()),
    };
    let mut steps = Vec::with_capacity(kept_ours.len() + kept_theirs.len());
    match winner {
        Winner::Ours => {
            steps.extend(kept_ours);
            steps.extend(kept_theirs);
        }
        Winner::Theirs => {
            steps.extend(kept_theirs);
            steps.extend(kept_ours);
        }
    }
    CompositeOp(steps)
}

/// Remove from `candidate` every op whose path conflicts with an op in
/// `against`.
fn strip_conflicting(candidate: &CompositeOp, against: &CompositeOp) -> Vec<OtOp> {
    candidate
        .0
        .iter()
        .filter(|op| {
            !against
                .0
                .iter()
                .any(|other| paths_conflict(op.path(), other.path()))
        })
        .cloned()
        .collect()
}

/// `true` if any op in `ours` conflicts with any op in `theirs`.
#[must_use]
pub fn has_conflict(ours: &CompositeOp, theirs: &CompositeOp) -> bool {
    ours.0.iter().any(|a| {
        theirs
            .0
            .iter()
            .any(|b| paths_conflict(a.path(), b.path()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::ops::PathSegment;
    use serde_json::json;

    fn insert(key: &str, v: serde_json::Value) -> OtOp {
        OtOp::Insert {
            path: vec![PathSegment::Key(key.into())],
            value: v,
        }
    }

    #[test]
    fn s3_non_conflicting_fields_both_survive() {
        let ours = CompositeOp(vec![insert("name", json!("Bob"))]);
        let theirs = CompositeOp(vec![insert("age", json!(30))]);
        assert!(!has_conflict(&ours, &theirs));
        let merged = transform(&ours, &theirs, Winner::Ours);
        assert_eq!(merged.0.len(), 2);
    }

    #[test]
    fn s4_conflicting_field_drops_loser() {
        let ours = CompositeOp(vec![insert("name", json!("Bob"))]);
        let theirs = CompositeOp(vec![insert("name", json!("Robert"))]);
        assert!(has_conflict(&ours, &theirs));

        let ours_wins = transform(&ours, &theirs, Winner::Ours);
        assert_eq!(ours_wins.0, vec![insert("name", json!("Bob"))]);

        let theirs_wins = transform(&ours, &theirs, Winner::Theirs);
        assert_eq!(theirs_wins.0, vec![insert("name", json!("Robert"))]);
    }

    #[test]
    fn nested_path_conflicts_with_parent() {
        let parent_replace = OtOp::Replace {
            path: vec![PathSegment::Key("meta".into())],
            old: json!({"a": 1}),
            new: json!({"a": 2}),
        };
        let child_insert = OtOp::Insert {
            path: vec![PathSegment::Key("meta".into()), PathSegment::Key("b".into())],
            value: json!(3),
        };
        let ours = CompositeOp(vec![parent_replace.clone()]);
        let theirs = CompositeOp(vec![child_insert]);
        assert!(has_conflict(&ours, &theirs));
        let result = transform(&ours, &theirs, Winner::Ours);
        assert_eq!(result.0, vec![parent_replace]);
    }
}
