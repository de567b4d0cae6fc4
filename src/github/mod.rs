// src/github/mod.rs
// =============================================================================
// This module handles talking to GitHub repositories.
//
// Currently implements:
// - Parsing GitHub URLs to extract owner/repo
// - Listing directories and fetching files through the contents API
// - Decoding base64 file bodies back into text
// - Recognising rate limit responses so the walk can stop cleanly
//
// Rust concepts:
// - Modules: Organizing related functionality
// - Public API: What other parts of the app can use
// =============================================================================

mod client;
mod content;
mod error;

pub use client::{GithubClient, RepoContents, RepoCoordinates, DEFAULT_API_URL};
pub use content::{ContentEntry, ContentKind};
pub use error::GithubError;
