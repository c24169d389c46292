//! `apply(doc, op)`: produce a new document without mutating
//! the input.

use serde_json::Value;

use crate::diff::TextPatch;

use super::ops::{CompositeOp, OtOp, Path, PathSegment};

/// Apply a composed operation to `doc`, returning the resulting document.
/// `doc` is not mutated; a patched clone is returned.
#[must_use]
pub fn apply(doc: &Value, op: &CompositeOp) -> Value {
    let mut out = doc.clone();
    for step in &op.0 {
        apply_one(&mut out, step);
    }
    out
}

fn apply_one(doc: &mut Value, op: &OtOp) {
    match op {
        OtOp::Insert { path, value } => insert_at(doc, path, value.clone()),
        OtOp::Remove { path, .. } => {
            remove_at(doc, path);
        }
        OtOp::Replace { path, new, .. } => insert_at(doc, path, new.clone()),
        OtOp::Move { from, to, .. } => {
            if let Some(value) = remove_at(doc, from) {
                insert_at(doc, to, value);
            }
        }
        OtOp::EditText { path, hunks } => {
            if let Some(Value::String(s)) = get_mut(doc, path) {
                let patch = TextPatch(hunks.clone());
                *s = patch.apply(s);
            }
        }
    }
}

fn get_mut<'a>(doc: &'a mut Value, path: &[PathSegment]) -> Option<&'a mut Value> {
    let mut current = doc;
    for seg in path {
        current = match (seg, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get_mut(k)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn parent_mut<'a>(doc: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    if path.is_empty() {
        return None;
    }
    get_mut(doc, &path[..path.len() - 1])
}

fn insert_at(doc: &mut Value, path: &Path, value: Value) {
    if path.is_empty() {
        *doc = value;
        return;
    }
    let last = path.last().expect("non-empty path");
    let Some(parent) = parent_mut(doc, path) else {
        return;
    };
    match (last, parent) {
        (PathSegment::Key(k), Value::Object(map)) => {
            map.insert(k.clone(), value);
        }
        (PathSegment::Index(i), Value::Array(arr)) => {
            if *i <= arr.len() {
                arr.insert(*i, value);
            } else {
                arr.push(value);
            }
        }
        _ => {}
    }
}

fn remove_at(doc: &mut Value, path: &Path) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let last = path.last().expect("non-empty path");
    let parent = parent_mut(doc, path)?;
    match (last, parent) {
        (PathSegment::Key(k), Value::Object(map)) => map.remove(k),
        (PathSegment::Index(i), Value::Array(arr)) => {
            if *i < arr.len() {
                Some(arr.remove(*i))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(steps: Vec<OtOp>) -> CompositeOp {
        CompositeOp(steps)
    }

    #[test]
    fn insert_object_key() {
        let doc = json!({});
        let result = apply(
            &doc,
            &op(vec![OtOp::Insert {
                path: vec![PathSegment::Key("a".into())],
                value: json!(1),
            }]),
        );
        assert_eq!(result, json!({"a": 1}));
        assert_eq!(doc, json!({})); // input untouched
    }

    #[test]
    fn remove_object_key() {
        let doc = json!({"a": 1, "b": 2});
        let result = apply(
            &doc,
            &op(vec![OtOp::Remove {
                path: vec![PathSegment::Key("a".into())],
                old: json!(1),
            }]),
        );
        assert_eq!(result, json!({"b": 2}));
    }

    #[test]
    fn replace_nested_value() {
        let doc = json!({"a": {"b": 1}});
        let result = apply(
            &doc,
            &op(vec![OtOp::Replace {
                path: vec![PathSegment::Key("a".into()), PathSegment::Key("b".into())],
                old: json!(1),
                new: json!(2),
            }]),
        );
        assert_eq!(result, json!({"a": {"b": 2}}));
    }

    #[test]
    fn move_array_element() {
        let doc = json!(["a", "b", "c"]);
        let result = apply(
            &doc,
            &op(vec![OtOp::Move {
                from: vec![PathSegment::Index(0)],
                to: vec![PathSegment::Index(2)],
                value: json!("a"),
            }]),
        );
        assert_eq!(result, json!(["b", "c", "a"]));
    }

    #[test]
    fn edit_text_applies_hunks() {
        use crate::diff::TextHunk;
        let doc = json!({"text": "abcdef"});
        let result = apply(
            &doc,
            &op(vec![OtOp::EditText {
                path: vec![PathSegment::Key("text".into())],
                hunks: vec![
                    TextHunk::Skip(3),
                    TextHunk::Insert("123".into()),
                    TextHunk::Skip(3),
                ],
            }]),
        );
        assert_eq!(result, json!({"text": "abc123def"}));
    }
}
