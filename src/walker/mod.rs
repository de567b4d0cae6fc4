// src/walker/mod.rs
// =============================================================================
// This module handles walking a repository's file tree.
//
// Features:
// - Recursive, concurrent directory traversal
// - Global cap on simultaneous file downloads
// - Cooperative cancellation shared by every branch of the walk
// - Rate limits stop the walk quietly; other errors abort it
// =============================================================================

mod outcome;
mod repo;

pub use repo::{RepoWalker, WalkSummary, WalkerOptions, DEFAULT_MAX_CONCURRENCY};
pub(crate) use repo::default_suffixes;
