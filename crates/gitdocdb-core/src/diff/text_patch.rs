//! Unicode-codepoint-aware text patches.
//!
//! A [`TextPatch`] is a minimal-ish sequence of skip/insert/delete hunks
//! computed over Unicode scalar values (`char`s), never UTF-16 code units,
//! so that patches are portable across implementations that don't share
//! JavaScript's string representation.

use serde::{Deserialize, Serialize};

/// One hunk of a text patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextHunk {
    /// Skip `count` code points unchanged.
    Skip(usize),
    /// Insert the given string at the current position.
    Insert(String),
    /// Delete `count` code points at the current position.
    Delete(usize),
}

/// A sequence of hunks transforming one string into another.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextPatch(pub Vec<TextHunk>);

impl TextPatch {
    /// Compute the patch that transforms `old` into `new`.
    ///
    /// Finds the common prefix and suffix (by code point) and encodes the
    /// differing middle as a delete-then-insert, which is sufficient to
    /// round-trip any pair of strings even though it is not always the
    /// minimal edit script.
    #[must_use]
    pub fn diff(old: &str, new: &str) -> Self {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix_len = old_chars
            .iter()
            .zip(new_chars.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let old_rest = &old_chars[prefix_len..];
        let new_rest = &new_chars[prefix_len..];

        let suffix_len = old_rest
            .iter()
            .rev()
            .zip(new_rest.iter().rev())
            .take_while(|(a, b)| a == b)
            .count()
            .min(old_rest.len())
            .min(new_rest.len());

        let old_mid_len = old_rest.len() - suffix_len;
        let new_mid = &new_rest[..new_rest.len() - suffix_len];

        let mut hunks = Vec::new();
        if prefix_len > 0 {
            hunks.push(TextHunk::Skip(prefix_len));
        }
        if old_mid_len > 0 {
            hunks.push(TextHunk::Delete(old_mid_len));
        }
        if !new_mid.is_empty() {
            hunks.push(TextHunk::Insert(new_mid.iter().collect()));
        }
        if suffix_len > 0 {
            hunks.push(TextHunk::Skip(suffix_len));
        }
        Self(hunks)
    }

    /// Apply this patch to `input`, producing the patched string.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        let chars: Vec<char> = input.chars().collect();
        let mut pos = 0usize;
        let mut out = String::new();
        for hunk in &self.0 {
            match hunk {
                TextHunk::Skip(n) => {
                    let end = (pos + n).min(chars.len());
                    out.extend(&chars[pos..end]);
                    pos = end;
                }
                TextHunk::Insert(s) => out.push_str(s),
                TextHunk::Delete(n) => {
                    pos = (pos + n).min(chars.len());
                }
            }
        }
        out.extend(&chars[pos..]);
        out
    }

    /// `true` if applying this patch is a no-op.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_text_ot_scenario() {
        // S5: "abcdef" -> "abc123def"
        let patch = TextPatch::diff("abcdef", "abc123def");
        assert_eq!(patch.apply("abcdef"), "abc123def");
    }

    #[test]
    fn no_change_yields_empty_patch() {
        let patch = TextPatch::diff("same", "same");
        assert!(patch.is_empty());
        assert_eq!(patch.apply("same"), "same");
    }

    #[test]
    fn full_replace() {
        let patch = TextPatch::diff("hello", "goodbye");
        assert_eq!(patch.apply("hello"), "goodbye");
    }

    #[test]
    fn unicode_codepoints_not_utf16_units() {
        // "𝄞" is a single scalar value but two UTF-16 code units; make sure
        // skip/delete counts are in code points.
        let old = "𝄞bc";
        let new = "𝄞xc";
        let patch = TextPatch::diff(old, new);
        assert_eq!(patch.apply(old), new);
    }

    #[test]
    fn pure_insertion_in_middle() {
        let patch = TextPatch::diff("foobar", "fooXXXbar");
        assert_eq!(patch.apply("foobar"), "fooXXXbar");
    }

    #[test]
    fn pure_deletion_in_middle() {
        let patch = TextPatch::diff("fooXXXbar", "foobar");
        assert_eq!(patch.apply("fooXXXbar"), "foobar");
    }
}
