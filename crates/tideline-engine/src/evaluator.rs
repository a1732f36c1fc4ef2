//! The per-file evaluation facade.

use std::path::Path;

use chrono::Utc;
use tideline_core::{Insight, RepositoryRanking, TidelineConfig, TidelineError, TrendResult};
use tideline_history::{
    build_series, list_commits, path_key, resolve_in_repository, HistoryOptions, RepositoryHandle,
};

use crate::{aggregate, insights, trend};

/// Evaluates files of one repository under one configuration.
///
/// Holds no state between calls: every evaluation re-reads history.
pub struct Evaluator<'r, R: RepositoryHandle + ?Sized> {
    repo: &'r R,
    config: TidelineConfig,
}

impl<'r, R: RepositoryHandle + ?Sized> Evaluator<'r, R> {
    pub fn new(repo: &'r R, config: TidelineConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &'r R {
        self.repo
    }

    pub fn config(&self) -> &TidelineConfig {
        &self.config
    }

    /// Evaluate the complexity trend of `path` over the last `window_days`.
    ///
    /// `path` may be absolute (it must then lie inside the repository) or
    /// relative to the repository root.
    ///
    /// # Errors
    ///
    /// - [`TidelineError::PathNotInRepository`] if `path` is outside the root.
    /// - [`TidelineError::HistoryAccess`] if history cannot be read.
    /// - [`TidelineError::InsufficientHistory`] if fewer than `min_commits`
    ///   commits touched the file in the window.
    /// - [`TidelineError::InsufficientData`] if too few snapshots could be
    ///   extracted.
    pub fn evaluate_file(&self, path: &Path, window_days: u32) -> Result<TrendResult, TidelineError> {
        let relative = resolve_in_repository(self.repo.root(), path)?;
        let key = path_key(&relative);

        let options = HistoryOptions::from_config(&self.config.evaluation, window_days);
        let commits = list_commits(self.repo, &relative, &options)?;

        let required = self.config.evaluation.min_commits.max(1);
        if commits.len() < required {
            return Err(TidelineError::InsufficientHistory {
                found: commits.len(),
                required,
            });
        }

        let series = build_series(self.repo, &relative, &key, &commits);
        tracing::debug!(
            file = %key,
            commits = commits.len(),
            snapshots = series.len(),
            "extracted evolution series"
        );

        let result = trend::compute(&series, window_days, &self.config.thresholds)?;
        tracing::info!(
            file = %key,
            commits = result.commits_evaluated,
            slope = format_args!("{:+.2}", result.slope),
            exposure = %result.exposure_level,
            low_confidence = result.is_low_confidence(),
            "evaluation complete"
        );
        Ok(result)
    }

    /// Evaluate `path` over the configured window.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate_file`](Self::evaluate_file).
    pub fn evaluate(&self, path: &Path) -> Result<TrendResult, TidelineError> {
        self.evaluate_file(path, self.config.evaluation.window_days)
    }

    /// Decay forecast for `path`, or 0.0 if it cannot be evaluated.
    pub fn forecast_decay(&self, path: &Path) -> f64 {
        match self.evaluate(path) {
            Ok(result) => result.decay_forecast,
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "no forecast");
                0.0
            }
        }
    }

    /// Insights for `path`, most severe first; empty if it cannot be
    /// evaluated.
    pub fn generate_insights(&self, path: &Path) -> Vec<Insight> {
        match self.evaluate(path) {
            Ok(result) => insights::derive(&result, &self.config.thresholds, Utc::now()),
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "no insights");
                Vec::new()
            }
        }
    }

    /// Evaluate up to `max_files` files of the repository, ranked by decay
    /// forecast.
    ///
    /// # Errors
    ///
    /// Returns an error only if the working tree cannot be listed; per-file
    /// failures are recorded in [`RepositoryRanking::skipped`].
    pub fn evaluate_repository(&self, max_files: usize) -> Result<RepositoryRanking, TidelineError> {
        aggregate::rank(self, max_files, |_| {})
    }

    /// [`evaluate_repository`](Self::evaluate_repository), calling
    /// `on_file` with each path before it is evaluated.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate_repository`](Self::evaluate_repository).
    pub fn evaluate_repository_with<F>(
        &self,
        max_files: usize,
        on_file: F,
    ) -> Result<RepositoryRanking, TidelineError>
    where
        F: FnMut(&Path),
    {
        aggregate::rank(self, max_files, on_file)
    }
}
