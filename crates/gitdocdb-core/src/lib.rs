//! Sync engine, document merger, tree merger, JSON OT algebra, and task
//! queue for gitdocdb.
//!
//! This crate has no notion of "where the working directory is" or "how a
//! database is opened" — that lives in the root `gitdocdb` crate, which
//! composes these pieces with [`gitdocdb_git`] into the public `Database`
//! and `Sync` handles.

pub mod diff;
pub mod error;
pub mod format;
pub mod merge;
pub mod model;
pub mod ot;
pub mod queue;
pub mod store;
pub mod sync;

pub use error::CoreError;
