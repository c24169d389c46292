//! JSON diff: produce a structured delta between two JSON trees.

mod delta;
mod json_diff;
mod text_patch;

pub use delta::{DeltaNode, Leaf};
pub use json_diff::{diff, DiffOptions};
pub use text_patch::{TextHunk, TextPatch};
