//! The delta tree.
//!
//! Internally the diff is a tagged tree — `DeltaNode` — not the key-based
//! `_t`/`_N` encoding the wire format uses. [`DeltaNode::to_wire`] and
//! [`DeltaNode::from_wire`] convert at the boundary only.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::text_patch::TextPatch;

/// A single leaf-level change (four leaf shapes, plus the array
/// move shape).
#[derive(Clone, Debug, PartialEq)]
pub enum Leaf {
    /// `[newValue]` — a key or index that did not exist before.
    Insert(Value),
    /// `[oldValue, newValue]` — a scalar or structurally-incomparable replace.
    Replace(Value, Value),
    /// `[textPatch, 0, 2]` — a string replaced via a text patch.
    TextPatch(TextPatch),
    /// `[oldValue, 0, 0]` — a key or index removed.
    Remove(Value),
    /// `[movedValue, newIndex, 3]` — an array element relocated without
    /// content changes.
    Move(Value, usize),
}

/// One node of the delta tree.
#[derive(Clone, Debug, PartialEq)]
pub enum DeltaNode {
    /// A leaf-level change.
    Leaf(Leaf),
    /// An object subtree whose children changed.
    Object(BTreeMap<String, DeltaNode>),
    /// An array subtree. `entries` is keyed by the *resulting* index for
    /// insert/replace/text/nest changes; `removed` is keyed by the
    /// *original* index for removes and move-sources.
    Array {
        /// Changes addressed by resulting (new) index.
        entries: BTreeMap<usize, DeltaNode>,
        /// Removes and move-sources addressed by original index.
        removed: BTreeMap<usize, Leaf>,
    },
}

impl DeltaNode {
    /// Encode this node into the key-based wire shape used for
    /// serialization and inter-implementation interop.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Leaf(leaf) => leaf_to_wire(leaf),
            Self::Object(children) => {
                let mut map = Map::new();
                for (key, child) in children {
                    map.insert(key.clone(), child.to_wire());
                }
                Value::Object(map)
            }
            Self::Array { entries, removed } => {
                let mut map = Map::new();
                map.insert("_t".to_owned(), Value::String("a".to_owned()));
                for (index, child) in entries {
                    map.insert(index.to_string(), child.to_wire());
                }
                for (index, leaf) in removed {
                    map.insert(format!("_{index}"), leaf_to_wire(leaf));
                }
                Value::Object(map)
            }
        }
    }

    /// Decode a node previously produced by [`to_wire`](Self::to_wire).
    ///
    /// # Panics
    /// Panics if `value` is not an object in the expected shape. This is
    /// only used for round-tripping our own output (tests, persistence),
    /// never for parsing untrusted input.
    #[must_use]
    pub fn from_wire(value: &Value) -> Self {
        if value.is_array() {
            return Self::Leaf(leaf_from_wire(value));
        }
        let Value::Object(map) = value else {
            panic!("delta wire value must be a leaf array or an object, got {value}");
        };
        if map.get("_t").and_then(Value::as_str) == Some("a") {
            let mut entries = BTreeMap::new();
            let mut removed = BTreeMap::new();
            for (key, v) in map {
                if key == "_t" {
                    continue;
                }
                if let Some(idx) = key.strip_prefix('_') {
                    let idx: usize = idx.parse().expect("removed-index key must be numeric");
                    removed.insert(idx, leaf_from_wire(v));
                } else {
                    let idx: usize = key.parse().expect("array delta key must be numeric");
                    entries.insert(idx, Self::from_wire(v));
                }
            }
            Self::Array { entries, removed }
        } else {
            let mut children = BTreeMap::new();
            for (key, v) in map {
                children.insert(key.clone(), Self::from_wire(v));
            }
            Self::Object(children)
        }
    }
}

fn leaf_to_wire(leaf: &Leaf) -> Value {
    match leaf {
        Leaf::Insert(v) => Value::Array(vec![v.clone()]),
        Leaf::Replace(old, new) => Value::Array(vec![old.clone(), new.clone()]),
        Leaf::TextPatch(patch) => Value::Array(vec![
            serde_json::to_value(patch).expect("TextPatch serializes"),
            Value::from(0),
            Value::from(2),
        ]),
        Leaf::Remove(old) => Value::Array(vec![old.clone(), Value::from(0), Value::from(0)]),
        Leaf::Move(value, new_index) => {
            Value::Array(vec![value.clone(), Value::from(*new_index), Value::from(3)])
        }
    }
}

fn leaf_from_wire(value: &Value) -> Leaf {
    let Value::Array(items) = value else {
        panic!("leaf delta must be encoded as a JSON array, got {value}");
    };
    match items.len() {
        1 => Leaf::Insert(items[0].clone()),
        2 => Leaf::Replace(items[0].clone(), items[1].clone()),
        3 => match items[2].as_u64() {
            Some(0) => Leaf::Remove(items[0].clone()),
            Some(2) => {
                let patch: TextPatch =
                    serde_json::from_value(items[0].clone()).expect("valid text patch");
                Leaf::TextPatch(patch)
            }
            Some(3) => {
                let new_index = items[1].as_u64().expect("move new-index is numeric") as usize;
                Leaf::Move(items[0].clone(), new_index)
            }
            _ => panic!("unrecognized 3-element leaf delta tag: {value}"),
        },
        n => panic!("unrecognized leaf delta arity {n}: {value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_insert_wire_roundtrip() {
        let node = DeltaNode::Leaf(Leaf::Insert(json!(42)));
        let wire = node.to_wire();
        assert_eq!(wire, json!([42]));
        assert_eq!(DeltaNode::from_wire(&wire), node);
    }

    #[test]
    fn leaf_replace_wire_roundtrip() {
        let node = DeltaNode::Leaf(Leaf::Replace(json!("old"), json!("new")));
        let wire = node.to_wire();
        assert_eq!(wire, json!(["old", "new"]));
        assert_eq!(DeltaNode::from_wire(&wire), node);
    }

    #[test]
    fn leaf_remove_wire_roundtrip() {
        let node = DeltaNode::Leaf(Leaf::Remove(json!("gone")));
        let wire = node.to_wire();
        assert_eq!(wire, json!(["gone", 0, 0]));
        assert_eq!(DeltaNode::from_wire(&wire), node);
    }

    #[test]
    fn object_subtree_wire_roundtrip() {
        let mut children = BTreeMap::new();
        children.insert("age".to_owned(), DeltaNode::Leaf(Leaf::Replace(json!(1), json!(2))));
        let node = DeltaNode::Object(children);
        let wire = node.to_wire();
        assert_eq!(wire, json!({"age": [1, 2]}));
        assert_eq!(DeltaNode::from_wire(&wire), node);
    }

    #[test]
    fn array_subtree_wire_roundtrip() {
        let mut entries = BTreeMap::new();
        entries.insert(1usize, DeltaNode::Leaf(Leaf::Insert(json!("x"))));
        let mut removed = BTreeMap::new();
        removed.insert(0usize, Leaf::Remove(json!("y")));
        let node = DeltaNode::Array { entries, removed };
        let wire = node.to_wire();
        assert_eq!(wire["_t"], json!("a"));
        assert_eq!(wire["1"], json!(["x"]));
        assert_eq!(wire["_0"], json!(["y", 0, 0]));
        assert_eq!(DeltaNode::from_wire(&wire), node);
    }
}
