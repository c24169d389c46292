//! JSON OT algebra: `fromDiff`, `apply`, and `transform`.

pub mod apply;
pub mod from_diff;
pub mod ops;
pub mod transform;

pub use apply::apply;
pub use from_diff::from_diff;
pub use ops::{path_key, paths_conflict, CompositeOp, OtOp, Path, PathSegment};
pub use transform::{has_conflict, transform, Winner};
