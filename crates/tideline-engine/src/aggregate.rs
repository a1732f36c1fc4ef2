//! Repository-wide ranking.

use std::path::Path;

use tideline_core::{RepositoryRanking, SkippedFile, TidelineError};
use tideline_history::{path_key, RepositoryHandle};

use crate::evaluator::Evaluator;

/// Evaluate discovered files in order until `max_files` succeed, then rank
/// the results by decay forecast, highest first.
///
/// Files that fail are logged and listed as skipped. Ties keep discovery
/// order, so the ranking is deterministic for a given tree.
///
/// # Errors
///
/// Returns an error only if the working tree cannot be listed.
pub fn rank<R, F>(
    evaluator: &Evaluator<'_, R>,
    max_files: usize,
    mut on_file: F,
) -> Result<RepositoryRanking, TidelineError>
where
    R: RepositoryHandle + ?Sized,
    F: FnMut(&Path),
{
    let repo = evaluator.repository();
    let files = repo.list_files(&evaluator.config().discovery.exclude_dirs)?;
    tracing::debug!(files = files.len(), max_files, "starting repository run");

    let mut evaluations = Vec::new();
    let mut skipped = Vec::new();

    for file in &files {
        if evaluations.len() >= max_files {
            break;
        }
        on_file(file.as_path());

        match evaluator.evaluate(file) {
            Ok(result) => evaluations.push(result),
            Err(e) => {
                if e.is_insufficient() {
                    tracing::debug!(file = %file.display(), reason = %e, "skipping file");
                } else {
                    tracing::warn!(file = %file.display(), error = %e, "failed to evaluate file");
                }
                skipped.push(SkippedFile {
                    path: path_key(file),
                    reason: e.to_string(),
                });
            }
        }
    }

    evaluations.sort_by(|a, b| b.decay_forecast.total_cmp(&a.decay_forecast));

    tracing::info!(
        evaluated = evaluations.len(),
        skipped = skipped.len(),
        "repository run complete"
    );

    Ok(RepositoryRanking {
        root: repo.root().to_path_buf(),
        evaluations,
        skipped,
    })
}
