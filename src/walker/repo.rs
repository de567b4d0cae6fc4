// src/walker/repo.rs
// =============================================================================
// This module walks a GitHub repository and feeds matching files to the tally.
//
// How it works:
// 1. List the repository root
// 2. For every entry in a listing, at the same time:
//    - directory: list it too (recursion)
//    - file ending in a wanted suffix: download it and count its letters
//    - anything else: ignore
// 3. A directory is done once all of its children are done
//
// Limits:
// - A single semaphore caps how many file downloads are open at once across
//   the whole walk (not per directory)
// - A CancellationToken is shared by every branch. Once it fires, no new
//   listings or downloads are started and waiting downloads give up
//
// Rust concepts:
// - Recursion with async: async fns can't call themselves directly, so
//   process_directory returns a boxed future
// - RAII: the semaphore permit is released when it goes out of scope
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::outcome::{Cancelled, Failure};
use crate::github::{ContentEntry, ContentKind, RepoContents, RepoCoordinates};
use crate::tally::LetterTally;

pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

pub fn default_suffixes() -> Vec<String> {
    vec![".js".to_string(), ".ts".to_string()]
}

/// Knobs for a walk.
#[derive(Debug, Clone)]
pub struct WalkerOptions {
    /// Upper bound on file downloads in flight at once
    pub max_concurrency: usize,
    /// File name endings to count (exact, case-sensitive)
    pub suffixes: Vec<String>,
}

impl Default for WalkerOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            suffixes: default_suffixes(),
        }
    }
}

/// What a finished walk did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    pub directories: usize,
    pub files_counted: usize,
    /// Matching files with no usable content (wrong encoding or empty)
    pub files_skipped: usize,
    /// Entries that were neither directories nor matching files
    pub entries_ignored: usize,
    /// True when the walk stopped early (rate limit or external cancel)
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct WalkStats {
    directories: AtomicUsize,
    files_counted: AtomicUsize,
    files_skipped: AtomicUsize,
    entries_ignored: AtomicUsize,
}

impl WalkStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, cancelled: bool) -> WalkSummary {
        WalkSummary {
            directories: self.directories.load(Ordering::Relaxed),
            files_counted: self.files_counted.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            entries_ignored: self.entries_ignored.load(Ordering::Relaxed),
            cancelled,
        }
    }
}

pub struct RepoWalker<C> {
    client: Arc<C>,
    repo: RepoCoordinates,
    limiter: Semaphore,
    max_concurrency: usize,
    suffixes: Vec<String>,
}

impl<C: RepoContents> RepoWalker<C> {
    pub fn new(client: Arc<C>, repo: RepoCoordinates, options: WalkerOptions) -> Self {
        // A zero-permit semaphore would park every download forever
        let max_concurrency = options.max_concurrency.max(1);
        Self {
            client,
            repo,
            limiter: Semaphore::new(max_concurrency),
            max_concurrency,
            suffixes: options.suffixes,
        }
    }

    pub fn repo(&self) -> &RepoCoordinates {
        &self.repo
    }

    /// Walks the whole repository.
    ///
    /// Every branch of the walk shares `token`. The caller keeps a clone so it
    /// can stop the walk (e.g. on Ctrl-C) and see afterwards whether it fired.
    /// Rate limits stop the walk but still return `Ok`; any other failure
    /// cancels the token, is logged and returned.
    pub async fn process_repository(
        &self,
        tally: &LetterTally,
        token: CancellationToken,
    ) -> Result<WalkSummary> {
        info!(
            repo = %self.repo,
            max_concurrency = self.max_concurrency,
            suffixes = ?self.suffixes,
            "Walking repository"
        );

        let stats = WalkStats::default();

        // Start at the root (empty path); everything else is reached from there
        if let Err(err) = self
            .process_directory(tally, &stats, &token, String::new())
            .await
        {
            error!(repo = %self.repo, "An error occurred while processing the repository: {:#}", err);
            token.cancel();
            return Err(err.context(format!("Failed to process repository {}", self.repo)));
        }

        let summary = stats.summary(token.is_cancelled());
        info!(
            directories = summary.directories,
            files_counted = summary.files_counted,
            files_skipped = summary.files_skipped,
            cancelled = summary.cancelled,
            "Walk finished"
        );
        Ok(summary)
    }

    // Lists `path` and fans out over its entries. Boxed so it can recurse.
    fn process_directory<'a>(
        &'a self,
        tally: &'a LetterTally,
        stats: &'a WalkStats,
        token: &'a CancellationToken,
        path: String,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            // Do the work, then decide whether a failure stops here or bubbles up
            let result = self.visit_directory(tally, stats, token, &path).await;
            let what = if path.is_empty() {
                "the repository root".to_string()
            } else {
                format!("directory '{}'", path)
            };
            settle(result, token, &what)
        }
        .boxed()
    }

    async fn visit_directory<'a>(
        &'a self,
        tally: &'a LetterTally,
        stats: &'a WalkStats,
        token: &'a CancellationToken,
        path: &str,
    ) -> Result<()> {
        // Another branch already stopped the walk: don't even start
        if token.is_cancelled() {
            return Err(Cancelled.into());
        }

        // Race the listing against cancellation so a stopped walk doesn't
        // sit waiting on GitHub
        let entries = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Cancelled.into()),
            listing = self.client.list_contents(&self.repo, path) => {
                listing.with_context(|| format!("Failed to list '{}'", path))?
            }
        };
        WalkStats::bump(&stats.directories);

        // Build one future per interesting entry; nothing runs until joined
        let mut children: Vec<BoxFuture<'a, Result<()>>> = Vec::new();
        for entry in entries {
            match entry.kind {
                ContentKind::Dir => {
                    info!(path = %entry.path, "Entering directory");
                    children.push(self.process_directory(tally, stats, token, entry.path));
                }
                ContentKind::File if entry.has_suffix(&self.suffixes) => {
                    children.push(self.process_file(entry, tally, stats, token).boxed());
                }
                // README.md, images, symlinks, submodules...
                _ => WalkStats::bump(&stats.entries_ignored),
            }
        }

        // Run all children concurrently; the first propagated error wins
        try_join_all(children).await?;
        Ok(())
    }

    async fn process_file(
        &self,
        item: ContentEntry,
        tally: &LetterTally,
        stats: &WalkStats,
        token: &CancellationToken,
    ) -> Result<()> {
        let result = self.count_file(&item, tally, stats, token).await;
        settle(result, token, &format!("file '{}'", item.name))
    }

    async fn count_file(
        &self,
        item: &ContentEntry,
        tally: &LetterTally,
        stats: &WalkStats,
        token: &CancellationToken,
    ) -> Result<()> {
        // Wait for a download slot, unless the walk is cancelled first.
        // The permit is held until this function returns, whichever way it returns
        let _permit = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Cancelled.into()),
            permit = self.limiter.acquire() => permit.context("Download limiter was closed")?,
        };

        debug!(file = %item.name, path = %item.path, size = item.size, "Processing file");

        // Same race as for listings: a cancelled walk abandons the download
        let records = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Cancelled.into()),
            fetched = self.client.list_contents(&self.repo, &item.path) => {
                fetched.with_context(|| format!("Failed to fetch '{}'", item.path))?
            }
        };

        // A file path answers with exactly one record; take the first
        let file = records
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("GitHub returned no content for '{}'", item.path))?;

        // Large files come back with encoding "none" and no body
        if !file.is_base64() {
            warn!(file = %item.name, encoding = ?file.encoding, "File is not base64 encoded, skipping");
            WalkStats::bump(&stats.files_skipped);
            return Ok(());
        }

        if file.is_empty() {
            warn!(file = %item.name, "File is empty or could not be read");
            WalkStats::bump(&stats.files_skipped);
            return Ok(());
        }

        // Bad base64 or non-UTF-8 bytes are unexpected: `?` propagates them
        let text = file.decoded_text()?;
        tally.count_letters(&text);
        WalkStats::bump(&stats.files_counted);
        Ok(())
    }
}

// Applies the failure table to the result of one directory or file step.
fn settle(result: Result<()>, token: &CancellationToken, what: &str) -> Result<()> {
    // Success needs no handling
    let err = match result {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    match Failure::classify(err) {
        // Throttled: stop every branch, but this isn't an error for the caller
        Failure::RateLimited { reset } => {
            error!(%reset, "Rate limit exceeded while processing {}. Stopping processing.", what);
            token.cancel();
            Ok(())
        }
        // Someone else stopped the walk; just unwind this branch
        Failure::Cancelled => {
            warn!("Processing of {} was canceled.", what);
            Ok(())
        }
        // Anything else: stop every branch and hand the error to the parent
        Failure::Unexpected(err) => {
            error!("An unexpected error occurred while processing {}: {:#}", what, err);
            token.cancel();
            Err(err)
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does process_directory return BoxFuture?
//    - An async fn's future type contains every future it awaits
//    - If it awaited itself, that type would have to contain itself
//    - Boxing puts the inner future behind a pointer, which breaks the cycle
//
// 2. What does try_join_all do?
//    - Polls every child future concurrently on the current task
//    - Finishes when all succeed, or as soon as one returns Err
//    - On Err the remaining children are dropped (their downloads stop)
//
// 3. What is tokio::select! with `biased;`?
//    - Waits on several futures and runs the branch of whichever finishes first
//    - `biased` checks branches top to bottom, so cancellation always wins a tie
//
// 4. Why `let _permit = ...` and not `let _ = ...`?
//    - `_` drops the value immediately, which would release the slot at once
//    - `_permit` keeps it alive until the end of the function
// -----------------------------------------------------------------------------
