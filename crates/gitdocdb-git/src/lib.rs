//! Git object gateway for gitdocdb.
//!
//! This crate defines the [`GitRepo`] trait — the single interface through
//! which the rest of gitdocdb interacts with git. No other gitdocdb crate
//! imports `gix` (or any other git library) directly; they depend on
//! `gitdocdb-git` and program against the trait.
//!
//! # Crate layout
//!
//! - [`repo`] — the [`GitRepo`] trait definition.
//! - [`types`] — value types used in trait signatures ([`GitOid`], [`Author`],
//!   [`CommitInfo`], [`TreeEntry`], [`Credentials`]).
//! - [`error`] — the [`GitError`] enum returned by all trait methods.
//! - [`gix_repo`] — the `gix`-backed [`GixRepo`] implementation.

mod gix_repo;
mod objects_impl;
mod refs_impl;
mod transport_impl;

pub mod error;
pub mod repo;
pub mod types;

pub use error::GitError;
pub use gix_repo::GixRepo;
pub use repo::GitRepo;
pub use types::{Author, CommitInfo, Credentials, EntryMode, GitOid, OidParseError, TreeEntry};
