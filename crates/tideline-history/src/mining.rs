//! Commit listing for a single path.

use std::path::Path;

use chrono::{DateTime, Utc};
use tideline_core::{CommitRef, EvaluationConfig, TidelineError, TimeWindow};

use crate::repo::RepositoryHandle;

/// Options for listing a file's commits.
///
/// # Examples
///
/// ```
/// use tideline_history::mining::HistoryOptions;
///
/// let opts = HistoryOptions::default();
/// assert_eq!(opts.window_days, 180);
/// assert_eq!(opts.max_count, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Only include commits from the last N days (default: 180).
    pub window_days: u32,
    /// Keep at most this many of the newest commits (default: 100).
    pub max_count: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            window_days: 180,
            max_count: 100,
        }
    }
}

impl HistoryOptions {
    /// Options taken from the evaluation config, with an explicit window.
    pub fn from_config(config: &EvaluationConfig, window_days: u32) -> Self {
        Self {
            window_days,
            max_count: config.max_commits,
        }
    }

    /// Earliest commit time included.
    pub fn since(&self) -> DateTime<Utc> {
        TimeWindow::from_days(self.window_days).start
    }
}

/// List the commits that touched `path` within the window, newest first.
///
/// The result never exceeds `max_count` and contains no commit older than
/// the window start, whatever the underlying handle returns. Commits with
/// equal timestamps keep the handle's order.
///
/// # Errors
///
/// Returns [`TidelineError::HistoryAccess`] if history cannot be read.
pub fn list_commits<R>(
    repo: &R,
    path: &Path,
    options: &HistoryOptions,
) -> Result<Vec<CommitRef>, TidelineError>
where
    R: RepositoryHandle + ?Sized,
{
    let since = options.since();
    let mut commits = repo.commits_touching(path, since, options.max_count)?;

    commits.retain(|c| c.timestamp >= since);
    commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    commits.truncate(options.max_count);

    tracing::debug!(
        path = %path.display(),
        window_days = options.window_days,
        commits = commits.len(),
        "listed commits"
    );
    Ok(commits)
}
