// src/github/error.rs
// =============================================================================
// Errors coming back from the GitHub contents API.
//
// The walker needs to tell a rate limit apart from every other failure: a rate
// limit quietly stops the walk, anything else aborts it. anyhow erases types,
// so this module uses a thiserror enum the walker can match on.
// =============================================================================

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GithubError {
    /// The API refused the request because the hourly quota is spent
    #[error("GitHub API rate limit exceeded, resets at {reset}")]
    RateLimitExceeded { reset: DateTime<Utc> },

    /// Any other non-success HTTP status
    #[error("GitHub API returned HTTP {status} for '{path}': {message}")]
    Status {
        status: StatusCode,
        path: String,
        message: String,
    },

    /// Transport or decoding failure inside reqwest
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),
}
