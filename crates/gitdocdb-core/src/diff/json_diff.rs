//! JSON diff: produce a [`DeltaNode`] between two JSON values.

use std::collections::BTreeMap;

use serde_json::Value;

use super::delta::{DeltaNode, Leaf};
use super::text_patch::TextPatch;

/// Diff options (`minTextLength` among them).
#[derive(Clone, Copy, Debug)]
pub struct DiffOptions {
    /// Minimum code-point length for a string pair to be diffed as text
    /// rather than replaced wholesale.
    pub min_text_length: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { min_text_length: 60 }
    }
}

/// Diff two JSON values, returning `None` if they are equal.
#[must_use]
pub fn diff(old: &Value, new: &Value, opts: DiffOptions) -> Option<DeltaNode> {
    if old == new {
        return None;
    }
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut children = BTreeMap::new();
            let mut keys: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                match (old_map.get(key), new_map.get(key)) {
                    (None, Some(nv)) => {
                        children.insert(key.clone(), DeltaNode::Leaf(Leaf::Insert(nv.clone())));
                    }
                    (Some(ov), None) => {
                        children.insert(key.clone(), DeltaNode::Leaf(Leaf::Remove(ov.clone())));
                    }
                    (Some(ov), Some(nv)) => {
                        if let Some(child) = diff(ov, nv, opts) {
                            children.insert(key.clone(), child);
                        }
                    }
                    (None, None) => unreachable!("key came from one of the two maps"),
                }
            }
            if children.is_empty() {
                None
            } else {
                Some(DeltaNode::Object(children))
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => diff_array(old_items, new_items, opts),
        (Value::String(old_s), Value::String(new_s)) => {
            if old_s.chars().count().min(new_s.chars().count()) >= opts.min_text_length {
                Some(DeltaNode::Leaf(Leaf::TextPatch(TextPatch::diff(old_s, new_s))))
            } else {
                Some(DeltaNode::Leaf(Leaf::Replace(old.clone(), new.clone())))
            }
        }
        _ => Some(DeltaNode::Leaf(Leaf::Replace(old.clone(), new.clone()))),
    }
}

/// Diff two arrays by matching elements via deep equality and a longest
/// common subsequence, so that unmoved elements never appear as
/// insert+remove pairs.
fn diff_array(old: &[Value], new: &[Value], opts: DiffOptions) -> Option<DeltaNode> {
    let lcs = longest_common_subsequence(old, new);

    // Map old index -> matched new index, for indices on the LCS spine.
    let mut old_is_stable = vec![false; old.len()];
    let mut new_is_stable = vec![false; new.len()];
    for &(oi, ni) in &lcs {
        old_is_stable[oi] = true;
        new_is_stable[ni] = true;
    }

    // Elements in `old` not on the spine: either removed, or moved (if an
    // equal value still exists, unmatched, somewhere in `new`).
    let mut new_used: Vec<bool> = new_is_stable.clone();
    let mut entries: BTreeMap<usize, DeltaNode> = BTreeMap::new();
    let mut removed: BTreeMap<usize, Leaf> = BTreeMap::new();

    for (oi, ov) in old.iter().enumerate() {
        if old_is_stable[oi] {
            continue;
        }
        if let Some(ni) = new
            .iter()
            .enumerate()
            .position(|(ni, nv)| !new_used[ni] && nv == ov)
        {
            new_used[ni] = true;
            removed.insert(oi, Leaf::Move(ov.clone(), ni));
        } else {
            removed.insert(oi, Leaf::Remove(ov.clone()));
        }
    }

    for (ni, nv) in new.iter().enumerate() {
        if new_is_stable[ni] {
            continue;
        }
        if new_used[ni] {
            // Consumed by a move above; the value itself didn't change.
            continue;
        }
        entries.insert(ni, DeltaNode::Leaf(Leaf::Insert(nv.clone())));
    }

    // Stable-by-value positions whose content nonetheless differs (e.g. an
    // object matched by LCS equality wouldn't land here since LCS requires
    // `==`; this branch only fires when old.len() == new.len() at the same
    // index and neither matched the LCS, handled above as insert+remove.
    // Nothing further to do here — LCS is computed over deep equality, so a
    // "stable" pair is always byte-identical.
    let _ = opts;

    if entries.is_empty() && removed.is_empty() {
        None
    } else {
        Some(DeltaNode::Array { entries, removed })
    }
}

/// Indices `(old_index, new_index)` of a longest common subsequence of
/// deep-equal elements, computed by classic DP.
fn longest_common_subsequence(old: &[Value], new: &[Value]) -> Vec<(usize, usize)> {
    let n = old.len();
    let m = new.len();
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}
