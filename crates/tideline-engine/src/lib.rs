//! Trend computation, insight derivation, and repository ranking.
//!
//! The pipeline for one file is: list commits, extract snapshots, fit the
//! trend, derive insights. [`Evaluator`] drives it against any
//! [`RepositoryHandle`](tideline_history::RepositoryHandle).
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use tideline_core::TidelineConfig;
//! use tideline_engine::Evaluator;
//! use tideline_history::GitRepository;
//!
//! let repo = GitRepository::open(Path::new(".")).unwrap();
//! let evaluator = Evaluator::new(&repo, TidelineConfig::default());
//! let trend = evaluator.evaluate_file(Path::new("src/app.py"), 180).unwrap();
//! println!("{} {:+.2}/month", trend.exposure_level, trend.slope);
//! ```

pub mod aggregate;
pub mod evaluator;
pub mod insights;
pub mod trend;

#[cfg(test)]
mod testing;

pub use evaluator::Evaluator;
