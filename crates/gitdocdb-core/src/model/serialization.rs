//! On-disk serialization modes for documents.

use serde::{Deserialize, Serialize};

/// How a document's body is encoded on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerializationMode {
    /// `.json`: sorted-key JSON with a trailing newline.
    #[default]
    Json,
    /// `.md`: YAML front matter (all fields but `_body`) followed by `_body`
    /// as markdown.
    FrontMatter,
    /// `.yml`: the full JSON body rendered as YAML.
    Yaml,
    /// `.bin`: an opaque blob, stored and returned byte-for-byte.
    Binary,
}

impl SerializationMode {
    /// The file extension (without the leading dot) for this mode.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::FrontMatter => "md",
            Self::Yaml => "yml",
            Self::Binary => "bin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(SerializationMode::Json.extension(), "json");
        assert_eq!(SerializationMode::FrontMatter.extension(), "md");
        assert_eq!(SerializationMode::Yaml.extension(), "yml");
        assert_eq!(SerializationMode::Binary.extension(), "bin");
    }

    #[test]
    fn default_is_json() {
        assert_eq!(SerializationMode::default(), SerializationMode::Json);
    }
}
