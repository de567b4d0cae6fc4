// src/walker/outcome.rs
// =============================================================================
// Sorting walk failures into "stop quietly" and "abort the walk".
//
// | Failure                  | What the walker does                     |
// |--------------------------|------------------------------------------|
// | GitHub rate limit        | log reset time, cancel, swallow          |
// | cancellation observed    | log a warning, swallow                   |
// | anything else            | log with context, cancel, propagate      |
// =============================================================================

use anyhow::Error;
use chrono::{DateTime, Utc};
use thiserror::Error as ThisError;

use crate::github::GithubError;

/// Returned when a step notices the walk was cancelled before it could start
/// (or finish waiting for) its remote call.
#[derive(ThisError, Debug)]
#[error("walk was cancelled")]
pub struct Cancelled;

#[derive(Debug)]
pub enum Failure {
    RateLimited { reset: DateTime<Utc> },
    Cancelled,
    Unexpected(Error),
}

impl Failure {
    /// Classifies an error bubbling out of a directory or file step.
    ///
    /// anyhow keeps the original error downcastable through `.context()`, so
    /// a rate limit wrapped with the failing path is still recognised.
    pub fn classify(err: Error) -> Self {
        if let Some(GithubError::RateLimitExceeded { reset }) = err.downcast_ref::<GithubError>() {
            return Failure::RateLimited { reset: *reset };
        }
        if err.is::<Cancelled>() {
            return Failure::Cancelled;
        }
        Failure::Unexpected(err)
    }
}
