//! On-disk document encoding: `.json`, `.md` front-matter, `.yml`, `.bin`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::SerializationMode;

/// Encode a document body to the bytes written to its working-tree file.
///
/// For [`SerializationMode::Binary`], `doc` must be a [`Value::String`]
/// holding the blob's base64 encoding (see [`crate::model::FatDoc::binary`]);
/// any other shape encodes as an empty blob.
#[must_use]
pub fn encode(doc: &Value, mode: SerializationMode) -> Vec<u8> {
    match mode {
        SerializationMode::Json => encode_json(doc),
        SerializationMode::FrontMatter => encode_front_matter(doc),
        SerializationMode::Yaml => encode_yaml(doc),
        SerializationMode::Binary => encode_binary(doc),
    }
}

/// Decode a working-tree file's bytes back into a document body.
///
/// For [`SerializationMode::Binary`], `bytes` are not required to be UTF-8;
/// the returned [`Value::String`] holds their base64 encoding, the blob
/// itself untouched.
///
/// # Errors
/// Returns [`CoreError::InvalidJson`] if the bytes are not valid UTF-8 or do
/// not parse under `mode` (not applicable to [`SerializationMode::Binary`]).
pub fn decode(bytes: &[u8], mode: SerializationMode, path: &str) -> Result<Value, CoreError> {
    if mode == SerializationMode::Binary {
        return Ok(Value::String(BASE64.encode(bytes)));
    }
    let text = std::str::from_utf8(bytes).map_err(|e| CoreError::InvalidJson {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    match mode {
        SerializationMode::Json => {
            serde_json::from_str(text).map_err(|e| CoreError::InvalidJson {
                path: path.to_string(),
                message: e.to_string(),
            })
        }
        SerializationMode::FrontMatter => decode_front_matter(text, path),
        SerializationMode::Yaml => serde_yaml::from_str(text).map_err(|e| CoreError::InvalidJson {
            path: path.to_string(),
            message: e.to_string(),
        }),
        SerializationMode::Binary => unreachable!("handled above"),
    }
}

/// Decode `doc`'s base64 payload back to raw bytes, opaquely.
fn encode_binary(doc: &Value) -> Vec<u8> {
    doc.as_str()
        .and_then(|s| BASE64.decode(s).ok())
        .unwrap_or_default()
}

/// Object keys sorted lexicographically, shortest round-trip numbers, a
/// trailing newline.
fn encode_json(doc: &Value) -> Vec<u8> {
    let sorted = sort_keys(doc);
    let mut text = serde_json::to_string_pretty(&sorted).expect("Value always serializes");
    text.push('\n');
    text.into_bytes()
}

fn encode_yaml(doc: &Value) -> Vec<u8> {
    serde_yaml::to_string(doc).expect("Value always serializes").into_bytes()
}

/// YAML front matter containing every field except `_body`, followed by
/// `_body` as the raw payload.
fn encode_front_matter(doc: &Value) -> Vec<u8> {
    let mut fields = doc.as_object().cloned().unwrap_or_default();
    let body = fields.remove("_body").and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default();
    let front = Value::Object(sort_keys_map(fields));
    let yaml = serde_yaml::to_string(&front).expect("Value always serializes");
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&yaml);
    out.push_str("---\n");
    out.push_str(&body);
    out.into_bytes()
}

fn decode_front_matter(text: &str, path: &str) -> Result<Value, CoreError> {
    let rest = text.strip_prefix("---\n").ok_or_else(|| CoreError::InvalidJson {
        path: path.to_string(),
        message: "missing front-matter delimiter".into(),
    })?;
    let (front, body) = rest.split_once("\n---\n").ok_or_else(|| CoreError::InvalidJson {
        path: path.to_string(),
        message: "missing closing front-matter delimiter".into(),
    })?;
    let mut value: Value = serde_yaml::from_str(front).map_err(|e| CoreError::InvalidJson {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    if let Some(map) = value.as_object_mut() {
        map.insert("_body".into(), Value::String(body.trim_end_matches('\n').to_string()));
    }
    Ok(value)
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sort_keys_map(map.clone())),
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn sort_keys_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(k, v)| (k, sort_keys(&v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_keys_sorted_and_newline_terminated() {
        let doc = json!({"b": 1, "a": 2});
        let bytes = encode(&doc, SerializationMode::Json);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find('a').unwrap() < text.find('b').unwrap());
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn json_roundtrip() {
        let doc = json!({"_id": "1", "name": "Bob"});
        let bytes = encode(&doc, SerializationMode::Json);
        let back = decode(&bytes, SerializationMode::Json, "1.json").unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn front_matter_roundtrip() {
        let doc = json!({"_id": "1", "title": "hi", "_body": "hello world"});
        let bytes = encode(&doc, SerializationMode::FrontMatter);
        let back = decode(&bytes, SerializationMode::FrontMatter, "1.md").unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn yaml_roundtrip() {
        let doc = json!({"_id": "1", "count": 3});
        let bytes = encode(&doc, SerializationMode::Yaml);
        let back = decode(&bytes, SerializationMode::Yaml, "1.yml").unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn binary_roundtrip_is_byte_exact() {
        let blob: &[u8] = &[0x00, 0xff, 0x10, 0x20, 0x89, b'P', b'N', b'G'];
        let doc = decode(blob, SerializationMode::Binary, "logo.bin").unwrap();
        let back = encode(&doc, SerializationMode::Binary);
        assert_eq!(back, blob);
    }

    #[test]
    fn binary_decode_does_not_require_utf8() {
        let blob: &[u8] = &[0xc0, 0xc1, 0xf5, 0xff];
        assert!(decode(blob, SerializationMode::Binary, "x.bin").is_ok());
    }
}
