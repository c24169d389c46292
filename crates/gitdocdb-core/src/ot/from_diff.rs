//! `fromDiff(delta) -> op`: lower a delta tree into a composed
//! OT operation.

use crate::diff::{DeltaNode, Leaf};

use super::ops::{CompositeOp, OtOp, Path, PathSegment};

/// Lower a delta tree into a composed operation.
#[must_use]
pub fn from_diff(delta: &DeltaNode) -> CompositeOp {
    let mut out = Vec::new();
    let mut path = Path::new();
    lower(delta, &mut path, &mut out);
    CompositeOp(out)
}

fn lower(node: &DeltaNode, path: &mut Path, out: &mut Vec<OtOp>) {
    match node {
        DeltaNode::Leaf(leaf) => out.push(leaf_to_op(leaf, path.clone())),
        DeltaNode::Object(children) => {
            for (key, child) in children {
                path.push(PathSegment::Key(key.clone()));
                lower(child, path, out);
                path.pop();
            }
        }
        DeltaNode::Array { entries, removed } => lower_array(entries, removed, path, out),
    }
}

fn leaf_to_op(leaf: &Leaf, path: Path) -> OtOp {
    match leaf {
        Leaf::Insert(v) => OtOp::Insert {
            path,
            value: v.clone(),
        },
        Leaf::Replace(old, new) => OtOp::Replace {
            path,
            old: old.clone(),
            new: new.clone(),
        },
        Leaf::Remove(old) => OtOp::Remove {
            path,
            old: old.clone(),
        },
        Leaf::TextPatch(patch) => OtOp::EditText {
            path,
            hunks: patch.0.clone(),
        },
        Leaf::Move(value, new_index) => {
            let mut to = path.clone();
            *to.last_mut().expect("move op has a non-empty path") = PathSegment::Index(*new_index);
            OtOp::Move {
                from: path,
                to,
                value: value.clone(),
            }
        }
    }
}

/// Lower one array container's children.
///
/// Canonical emission order within the container is replace, text, remove,
/// move, insert. Moves are decomposed into a remove-at-source
/// plus an insert-at-destination so that applying the resulting composite
/// sequentially never needs running-offset bookkeeping: every remove (by
/// original index, processed highest-first so earlier removals never
/// invalidate a later one's index) happens before every insert (by final
/// index, processed lowest-first so each insert lands in the array exactly
/// where the prior ones left it).
fn lower_array(
    entries: &std::collections::BTreeMap<usize, DeltaNode>,
    removed: &std::collections::BTreeMap<usize, Leaf>,
    path: &mut Path,
    out: &mut Vec<OtOp>,
) {
    let mut replace_and_text = Vec::new();
    let mut removes_desc: Vec<(usize, OtOp)> = Vec::new();
    let mut inserts_asc: Vec<(usize, OtOp)> = Vec::new();

    for (&index, node) in entries {
        path.push(PathSegment::Index(index));
        match node {
            DeltaNode::Leaf(Leaf::Insert(v)) => {
                inserts_asc.push((
                    index,
                    OtOp::Insert {
                        path: path.clone(),
                        value: v.clone(),
                    },
                ));
            }
            DeltaNode::Leaf(Leaf::Replace(..) | Leaf::TextPatch(..)) => {
                if let DeltaNode::Leaf(leaf) = node {
                    replace_and_text.push(leaf_to_op(leaf, path.clone()));
                }
            }
            other => lower(other, path, &mut replace_and_text),
        }
        path.pop();
    }

    for (&index, leaf) in removed {
        path.push(PathSegment::Index(index));
        match leaf {
            Leaf::Remove(old) => {
                removes_desc.push((
                    index,
                    OtOp::Remove {
                        path: path.clone(),
                        old: old.clone(),
                    },
                ));
            }
            Leaf::Move(value, new_index) => {
                removes_desc.push((
                    index,
                    OtOp::Remove {
                        path: path.clone(),
                        old: value.clone(),
                    },
                ));
                let mut to = path.clone();
                *to.last_mut().expect("non-empty path") = PathSegment::Index(*new_index);
                inserts_asc.push((
                    *new_index,
                    OtOp::Insert {
                        path: to,
                        value: value.clone(),
                    },
                ));
            }
            _ => unreachable!("only Remove and Move appear in the removed map"),
        }
        path.pop();
    }

    removes_desc.sort_by(|a, b| b.0.cmp(&a.0));
    inserts_asc.sort_by_key(|(index, _)| *index);

    out.extend(replace_and_text);
    out.extend(removes_desc.into_iter().map(|(_, op)| op));
    out.extend(inserts_asc.into_iter().map(|(_, op)| op));
}
