use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::error::TidelineError;

/// Average days per month used for window and frequency arithmetic.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// A commit that touched the evaluated path.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tideline_core::CommitRef;
///
/// let commit = CommitRef {
///     id: "3f2a9c1e7b5d40aa".into(),
///     timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
///     author: "alice".into(),
/// };
/// assert_eq!(commit.short_id(), "3f2a9c1e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRef {
    /// Full hex object id.
    pub id: String,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Author name.
    pub author: String,
}

impl CommitRef {
    /// First eight characters of the commit id, for logs and tables.
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }
}

/// One complexity measurement of a file at a specific commit.
///
/// A snapshot with `complexity == 0` comes from content that did not parse
/// at that point in history. It is still a valid data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Cyclomatic complexity of the whole file.
    pub complexity: u32,
    /// Raw line count.
    pub lines_of_code: u32,
    /// Number of function definitions.
    pub function_count: u32,
    /// Number of class definitions.
    pub class_count: u32,
    /// Commit author name.
    pub author: String,
    /// Commit the snapshot was taken at.
    pub commit_id: String,
}

/// The ordered complexity history of one file, oldest first.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tideline_core::{EvolutionSeries, Snapshot};
///
/// let snap = |secs: i64, complexity: u32| Snapshot {
///     timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
///     complexity,
///     lines_of_code: 10,
///     function_count: 1,
///     class_count: 0,
///     author: "alice".into(),
///     commit_id: format!("c{secs}"),
/// };
/// let series = EvolutionSeries::new("app.py", vec![snap(200, 4), snap(100, 2)]);
/// assert_eq!(series.snapshots()[0].complexity, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionSeries {
    file_path: String,
    snapshots: Vec<Snapshot>,
}

impl EvolutionSeries {
    /// Build a series, sorting snapshots by timestamp (stable on ties).
    pub fn new(file_path: impl Into<String>, mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by_key(|s| s.timestamp);
        Self {
            file_path: file_path.into(),
            snapshots,
        }
    }

    /// Repository-relative path of the file.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Snapshots, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of distinct authors across the series.
    pub fn author_count(&self) -> usize {
        self.snapshots
            .iter()
            .map(|s| s.author.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Three-tier classification of the decay forecast.
///
/// # Examples
///
/// ```
/// use tideline_core::{ExposureLevel, ThresholdConfig};
///
/// let t = ThresholdConfig::default();
/// assert_eq!(ExposureLevel::from_forecast(0.4, &t), ExposureLevel::Low);
/// assert_eq!(ExposureLevel::from_forecast(0.41, &t), ExposureLevel::Medium);
/// assert_eq!(ExposureLevel::from_forecast(0.71, &t), ExposureLevel::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExposureLevel {
    Low,
    Medium,
    High,
}

impl ExposureLevel {
    /// Classify a decay forecast. Both bounds are exclusive.
    pub fn from_forecast(forecast: f64, thresholds: &ThresholdConfig) -> Self {
        if forecast > thresholds.exposure_high {
            ExposureLevel::High
        } else if forecast > thresholds.exposure_medium {
            ExposureLevel::Medium
        } else {
            ExposureLevel::Low
        }
    }

    /// Returns `true` if `self` is at least as exposed as `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tideline_core::ExposureLevel;
    ///
    /// assert!(ExposureLevel::High.meets_threshold(ExposureLevel::Medium));
    /// assert!(!ExposureLevel::Low.meets_threshold(ExposureLevel::Medium));
    /// ```
    pub fn meets_threshold(self, threshold: ExposureLevel) -> bool {
        self >= threshold
    }
}

impl fmt::Display for ExposureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureLevel::Low => write!(f, "LOW"),
            ExposureLevel::Medium => write!(f, "MEDIUM"),
            ExposureLevel::High => write!(f, "HIGH"),
        }
    }
}

impl FromStr for ExposureLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ExposureLevel::Low),
            "medium" => Ok(ExposureLevel::Medium),
            "high" => Ok(ExposureLevel::High),
            other => Err(format!("unknown exposure level: {other}")),
        }
    }
}

/// Three-tier classification of the trend slope.
///
/// # Examples
///
/// ```
/// use tideline_core::QualityPattern;
///
/// assert_eq!(QualityPattern::from_slope(-1.0, 0.5), QualityPattern::Improving);
/// assert_eq!(QualityPattern::from_slope(0.5, 0.5), QualityPattern::Stable);
/// assert_eq!(QualityPattern::from_slope(0.51, 0.5), QualityPattern::Declining);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityPattern {
    Improving,
    Stable,
    Declining,
}

impl QualityPattern {
    /// Classify a slope against a symmetric threshold.
    pub fn from_slope(slope: f64, threshold: f64) -> Self {
        if slope < -threshold {
            QualityPattern::Improving
        } else if slope > threshold {
            QualityPattern::Declining
        } else {
            QualityPattern::Stable
        }
    }

    /// One-line summary of the trend for this pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use tideline_core::QualityPattern;
    ///
    /// let text = QualityPattern::Declining.description(1.25);
    /// assert_eq!(text, "Quality degradation: +1.25 complexity increase/month");
    /// ```
    pub fn description(self, slope: f64) -> String {
        match self {
            QualityPattern::Improving => {
                format!("Quality improvement: {slope:.2} complexity reduction/month")
            }
            QualityPattern::Declining => {
                format!("Quality degradation: +{slope:.2} complexity increase/month")
            }
            QualityPattern::Stable => format!("Stable complexity: {slope:+.2} change/month"),
        }
    }

    /// Advisory lines for a file showing this pattern.
    pub fn recommendations(self, slope: f64) -> Vec<String> {
        match self {
            QualityPattern::Improving => vec![
                "Quality improvement pattern detected.".into(),
                format!(
                    "Complexity is reducing at {:.2} units/month.",
                    slope.abs()
                ),
                "Consider applying this pattern across other modules.".into(),
            ],
            QualityPattern::Declining => vec![
                "Quality degradation pattern detected.".into(),
                format!("Complexity is increasing at {slope:.2} units/month."),
                "Refactoring or architectural review may be warranted.".into(),
            ],
            QualityPattern::Stable => vec![
                "Complexity trend is stable.".into(),
                "No immediate action required; monitor for future changes.".into(),
            ],
        }
    }
}

impl fmt::Display for QualityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityPattern::Improving => write!(f, "IMPROVING"),
            QualityPattern::Stable => write!(f, "STABLE"),
            QualityPattern::Declining => write!(f, "DECLINING"),
        }
    }
}

/// A confidence value validated to lie in `[0.0, 1.0]`.
///
/// # Examples
///
/// ```
/// use tideline_core::ConfidenceRank;
///
/// let rank = ConfidenceRank::new(0.75).unwrap();
/// assert_eq!(rank.percentage(), 75);
/// assert!(rank.is_high_confidence());
/// assert_eq!(rank.description(), "High Confidence");
/// assert!(ConfidenceRank::new(1.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConfidenceRank(f64);

impl ConfidenceRank {
    /// # Errors
    ///
    /// Returns [`TidelineError::Config`] if `value` is outside `[0.0, 1.0]`.
    pub fn new(value: f64) -> Result<Self, TidelineError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TidelineError::Config(format!(
                "confidence rank must be between 0.0 and 1.0, got {value}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whole percent, truncated.
    pub fn percentage(self) -> u32 {
        (self.0 * 100.0) as u32
    }

    pub fn is_high_confidence(self) -> bool {
        self.0 >= 0.75
    }

    pub fn description(self) -> &'static str {
        if self.0 >= 0.9 {
            "Very High Confidence"
        } else if self.0 >= 0.75 {
            "High Confidence"
        } else if self.0 >= 0.5 {
            "Medium Confidence"
        } else {
            "Low Confidence"
        }
    }
}

impl TryFrom<f64> for ConfidenceRank {
    type Error = TidelineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfidenceRank> for f64 {
    fn from(rank: ConfidenceRank) -> Self {
        rank.0
    }
}

/// A closed time interval used as the history window.
///
/// # Examples
///
/// ```
/// use tideline_core::TimeWindow;
///
/// let window = TimeWindow::from_days(61);
/// assert_eq!(window.days(), 61);
/// assert!((window.months() - 2.0).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The last `days` days, ending now.
    pub fn from_days(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    /// The `days` days ending at `end`.
    ///
    /// A window reaching past the earliest representable instant starts
    /// there, so an oversized window covers all history.
    pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    /// The last `months` average-length months, ending now.
    pub fn last_months(months: f64) -> Self {
        Self::from_days((months * DAYS_PER_MONTH) as u32)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn months(&self) -> f64 {
        self.days() as f64 / DAYS_PER_MONTH
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Evaluation output for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    /// Repository-relative path.
    pub file_path: String,
    /// History window the evaluation used.
    pub window_days: u32,
    /// Series length.
    pub commits_evaluated: usize,
    /// Least-squares slope of complexity over commit order, read as per month.
    pub slope: f64,
    /// Complexity at the most recent snapshot.
    pub current_complexity: u32,
    /// Relative change of the recent mean over the historical mean.
    pub growth_rate: f64,
    /// Bounded decay risk in `[0.0, 1.0]`.
    pub decay_forecast: f64,
    pub exposure_level: ExposureLevel,
    pub confidence_score: ConfidenceRank,
    /// Set when the series is too short for a confident result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_warning: Option<String>,
    pub quality_pattern: QualityPattern,
    /// Distinct authors across the series.
    pub author_count: usize,
    /// Evaluated commits per month over the window.
    pub change_frequency: f64,
    /// Full evolution series, oldest first.
    pub timetable: Vec<Snapshot>,
}

impl TrendResult {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence_warning.is_some()
    }

    /// Summary line for the quality pattern.
    pub fn description(&self) -> String {
        self.quality_pattern.description(self.slope)
    }

    pub fn recommendations(&self) -> Vec<String> {
        self.quality_pattern.recommendations(self.slope)
    }
}

/// Kind of threshold-triggered insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Slope exceeds the growth threshold.
    ComplexityGrowth,
    /// Decay forecast exceeds the decay threshold.
    QualityDecay,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::ComplexityGrowth => write!(f, "complexity_growth"),
            InsightKind::QualityDecay => write!(f, "quality_decay"),
        }
    }
}

/// A discrete, severity-ranked signal derived from a trend result.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tideline_core::{Insight, InsightKind};
///
/// let insight = Insight {
///     file_path: "app.py".into(),
///     kind: InsightKind::QualityDecay,
///     severity: 0.9,
///     description: "High risk of quality decay (90%)".into(),
///     confidence: 0.8075,
///     detected_at: Utc::now(),
/// };
/// assert_eq!(insight.kind.to_string(), "quality_decay");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub file_path: String,
    pub kind: InsightKind,
    /// Severity in `[0.0, 1.0]`.
    pub severity: f64,
    pub description: String,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}

/// A file the repository run could not evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Count of evaluations per quality pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDistribution {
    pub improving: usize,
    pub stable: usize,
    pub declining: usize,
}

impl PatternDistribution {
    pub fn total(&self) -> usize {
        self.improving + self.stable + self.declining
    }
}

/// Multi-file evaluation results ranked by decay forecast.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use tideline_core::RepositoryRanking;
///
/// let ranking = RepositoryRanking {
///     root: PathBuf::from("."),
///     evaluations: vec![],
///     skipped: vec![],
/// };
/// assert_eq!(ranking.health_score(), 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRanking {
    pub root: PathBuf,
    /// Sorted by `decay_forecast` descending.
    pub evaluations: Vec<TrendResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedFile>,
}

impl RepositoryRanking {
    pub fn distribution(&self) -> PatternDistribution {
        let mut dist = PatternDistribution::default();
        for eval in &self.evaluations {
            match eval.quality_pattern {
                QualityPattern::Improving => dist.improving += 1,
                QualityPattern::Stable => dist.stable += 1,
                QualityPattern::Declining => dist.declining += 1,
            }
        }
        dist
    }

    /// Repository health on a 0–10 scale: improving files count fully,
    /// stable files count 0.6, declining files count nothing.
    pub fn health_score(&self) -> f64 {
        let dist = self.distribution();
        let total = dist.total();
        if total == 0 {
            return 0.0;
        }
        let weighted = dist.improving as f64 + dist.stable as f64 * 0.6;
        weighted / total as f64 * 10.0
    }

    pub fn files_with_pattern(&self, pattern: QualityPattern) -> Vec<&TrendResult> {
        self.evaluations
            .iter()
            .filter(|e| e.quality_pattern == pattern)
            .collect()
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use tideline_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
