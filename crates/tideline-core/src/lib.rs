//! Core types, configuration, and error handling for Tideline.
//!
//! This crate provides the shared foundation used by all other Tideline crates:
//! - [`TidelineError`]: unified error type using `thiserror`
//! - [`TidelineConfig`]: configuration loaded from `.tideline.toml`
//! - Shared types: [`CommitRef`], [`Snapshot`], [`EvolutionSeries`],
//!   [`TrendResult`], [`Insight`], [`RepositoryRanking`], [`ExposureLevel`],
//!   [`QualityPattern`], [`ConfidenceRank`], [`TimeWindow`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{DiscoveryConfig, EvaluationConfig, ThresholdConfig, TidelineConfig};
pub use error::TidelineError;
pub use types::{
    CommitRef, ConfidenceRank, EvolutionSeries, ExposureLevel, Insight, InsightKind,
    OutputFormat, PatternDistribution, QualityPattern, RepositoryRanking, SkippedFile, Snapshot,
    TimeWindow, TrendResult, DAYS_PER_MONTH,
};

/// A convenience `Result` type for Tideline operations.
pub type Result<T> = std::result::Result<T, TidelineError>;
