use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TidelineError;

/// Top-level configuration loaded from `.tideline.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use tideline_core::TidelineConfig;
///
/// let config = TidelineConfig::default();
/// assert_eq!(config.evaluation.window_days, 180);
/// assert_eq!(config.thresholds.exposure_high, 0.7);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TidelineConfig {
    /// History window and run limits.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Classification and insight thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// File discovery settings for repository runs.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl TidelineConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Io`] if the file cannot be read,
    /// [`TidelineError::Toml`] if the content is not valid TOML, or
    /// [`TidelineError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tideline_core::TidelineConfig;
    /// use std::path::Path;
    ///
    /// let config = TidelineConfig::from_file(Path::new(".tideline.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, TidelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Toml`] if parsing fails, or
    /// [`TidelineError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use tideline_core::TidelineConfig;
    ///
    /// let toml = r#"
    /// [evaluation]
    /// window_days = 90
    /// "#;
    /// let config = TidelineConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.evaluation.window_days, 90);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, TidelineError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TIDELINE_*` environment overrides on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Config`] if a variable is set but not a
    /// valid number.
    pub fn apply_env(&mut self) -> Result<(), TidelineError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `TIDELINE_WINDOW_DAYS`, `TIDELINE_MAX_COMMITS`,
    /// `TIDELINE_MIN_COMMITS`, `TIDELINE_MAX_FILES`.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Config`] if a value does not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use tideline_core::TidelineConfig;
    ///
    /// let mut config = TidelineConfig::default();
    /// config
    ///     .apply_overrides(|key| (key == "TIDELINE_MAX_FILES").then(|| "10".to_string()))
    ///     .unwrap();
    /// assert_eq!(config.evaluation.max_files, 10);
    /// ```
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), TidelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let eval = &mut self.evaluation;
        override_number(&lookup, "TIDELINE_WINDOW_DAYS", &mut eval.window_days)?;
        override_number(&lookup, "TIDELINE_MAX_COMMITS", &mut eval.max_commits)?;
        override_number(&lookup, "TIDELINE_MIN_COMMITS", &mut eval.min_commits)?;
        override_number(&lookup, "TIDELINE_MAX_FILES", &mut eval.max_files)?;
        self.validate()
    }

    /// Check that every value is in a usable range.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), TidelineError> {
        let eval = &self.evaluation;
        if eval.window_days == 0 {
            return Err(TidelineError::Config("window_days must be positive".into()));
        }
        if eval.max_commits == 0 {
            return Err(TidelineError::Config("max_commits must be positive".into()));
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("decay_insight", t.decay_insight),
            ("exposure_high", t.exposure_high),
            ("exposure_medium", t.exposure_medium),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TidelineError::Config(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if t.exposure_medium > t.exposure_high {
            return Err(TidelineError::Config(
                "exposure_medium must not exceed exposure_high".into(),
            ));
        }
        if t.growth_slope < 0.0 || t.pattern_slope < 0.0 {
            return Err(TidelineError::Config(
                "slope thresholds must be non-negative".into(),
            ));
        }
        if t.mean_window == 0 {
            return Err(TidelineError::Config("mean_window must be positive".into()));
        }
        Ok(())
    }
}

fn override_number<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), TidelineError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| TidelineError::Config(format!("{key} is not a valid number: {raw}")))?;
    }
    Ok(())
}

/// History window and run limits.
///
/// # Examples
///
/// ```
/// use tideline_core::EvaluationConfig;
///
/// let config = EvaluationConfig::default();
/// assert_eq!(config.max_commits, 100);
/// assert_eq!(config.min_commits, 2);
/// assert_eq!(config.max_files, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Only consider commits from the last N days (default: 180).
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Maximum commits read per file (default: 100).
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
    /// Raw commits required before extraction starts (default: 2).
    #[serde(default = "default_min_commits")]
    pub min_commits: usize,
    /// Successful evaluations collected per repository run (default: 50).
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_window_days() -> u32 {
    180
}

fn default_max_commits() -> usize {
    100
}

fn default_min_commits() -> usize {
    2
}

fn default_max_files() -> usize {
    50
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            max_commits: default_max_commits(),
            min_commits: default_min_commits(),
            max_files: default_max_files(),
        }
    }
}

/// Classification and insight thresholds.
///
/// # Examples
///
/// ```
/// use tideline_core::ThresholdConfig;
///
/// let t = ThresholdConfig::default();
/// assert_eq!(t.growth_slope, 0.5);
/// assert_eq!(t.decay_insight, 0.7);
/// assert_eq!(t.exposure_medium, 0.4);
/// assert_eq!(t.pattern_slope, 0.5);
/// assert_eq!(t.mean_window, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Slope above which a `complexity_growth` insight fires (default: 0.5).
    #[serde(default = "default_growth_slope")]
    pub growth_slope: f64,
    /// Decay forecast above which a `quality_decay` insight fires (default: 0.7).
    #[serde(default = "default_decay_insight")]
    pub decay_insight: f64,
    /// Decay forecast above which exposure is HIGH (default: 0.7).
    #[serde(default = "default_exposure_high")]
    pub exposure_high: f64,
    /// Decay forecast above which exposure is MEDIUM (default: 0.4).
    #[serde(default = "default_exposure_medium")]
    pub exposure_medium: f64,
    /// Slope magnitude separating IMPROVING/DECLINING from STABLE (default: 0.5).
    #[serde(default = "default_pattern_slope")]
    pub pattern_slope: f64,
    /// Points averaged at each end of the series for growth (default: 5).
    #[serde(default = "default_mean_window")]
    pub mean_window: usize,
    /// Series shorter than this carry a low-confidence warning (default: 5).
    #[serde(default = "default_low_confidence_below")]
    pub low_confidence_below: usize,
}

fn default_growth_slope() -> f64 {
    0.5
}

fn default_decay_insight() -> f64 {
    0.7
}

fn default_exposure_high() -> f64 {
    0.7
}

fn default_exposure_medium() -> f64 {
    0.4
}

fn default_pattern_slope() -> f64 {
    0.5
}

fn default_mean_window() -> usize {
    5
}

fn default_low_confidence_below() -> usize {
    5
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            growth_slope: default_growth_slope(),
            decay_insight: default_decay_insight(),
            exposure_high: default_exposure_high(),
            exposure_medium: default_exposure_medium(),
            pattern_slope: default_pattern_slope(),
            mean_window: default_mean_window(),
            low_confidence_below: default_low_confidence_below(),
        }
    }
}

/// File discovery settings for repository runs.
///
/// # Examples
///
/// ```
/// use tideline_core::DiscoveryConfig;
///
/// let config = DiscoveryConfig::default();
/// assert!(config.exclude_dirs.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Extra directory names to skip, on top of the built-in
    /// virtualenv/cache/build list.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let config = TidelineConfig::default();
        assert_eq!(config.evaluation.window_days, 180);
        assert_eq!(config.evaluation.max_commits, 100);
        assert_eq!(config.evaluation.min_commits, 2);
        assert_eq!(config.evaluation.max_files, 50);
        assert_eq!(config.thresholds.growth_slope, 0.5);
        assert_eq!(config.thresholds.decay_insight, 0.7);
        assert_eq!(config.thresholds.exposure_high, 0.7);
        assert_eq!(config.thresholds.exposure_medium, 0.4);
        assert_eq!(config.thresholds.pattern_slope, 0.5);
        assert_eq!(config.thresholds.mean_window, 5);
        assert_eq!(config.thresholds.low_confidence_below, 5);
        assert!(config.discovery.exclude_dirs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[evaluation]
window_days = 365
min_commits = 5
"#;
        let config = TidelineConfig::from_toml(toml).unwrap();
        assert_eq!(config.evaluation.window_days, 365);
        assert_eq!(config.evaluation.min_commits, 5);
        assert_eq!(config.evaluation.max_commits, 100);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[evaluation]
window_days = 90
max_commits = 40
min_commits = 3
max_files = 10

[thresholds]
growth_slope = 1.0
decay_insight = 0.8
exposure_high = 0.75
exposure_medium = 0.3
pattern_slope = 0.1
mean_window = 3
low_confidence_below = 4

[discovery]
exclude_dirs = ["migrations", "vendor"]
"#;
        let config = TidelineConfig::from_toml(toml).unwrap();
        assert_eq!(config.evaluation.max_commits, 40);
        assert_eq!(config.evaluation.max_files, 10);
        assert_eq!(config.thresholds.pattern_slope, 0.1);
        assert_eq!(config.thresholds.mean_window, 3);
        assert_eq!(
            config.discovery.exclude_dirs,
            vec!["migrations".to_string(), "vendor".to_string()]
        );
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = TidelineConfig::from_toml("").unwrap();
        assert_eq!(config.evaluation.window_days, 180);
        assert_eq!(config.thresholds.exposure_high, 0.7);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = TidelineConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let toml = r#"
[thresholds]
exposure_high = 1.5
"#;
        let err = TidelineConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("exposure_high"));

        let inverted = r#"
[thresholds]
exposure_high = 0.3
exposure_medium = 0.6
"#;
        assert!(TidelineConfig::from_toml(inverted).is_err());
    }

    #[test]
    fn zero_window_is_rejected() {
        let toml = r#"
[evaluation]
window_days = 0
"#;
        assert!(TidelineConfig::from_toml(toml).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = TidelineConfig::from_toml("[evaluation]\nwindow_days = 30\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("TIDELINE_WINDOW_DAYS", "120"),
            ("TIDELINE_MIN_COMMITS", " 5 "),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.evaluation.window_days, 120);
        assert_eq!(config.evaluation.min_commits, 5);
        assert_eq!(config.evaluation.max_files, 50);
    }

    #[test]
    fn malformed_override_is_an_error() {
        let mut config = TidelineConfig::default();
        let err = config
            .apply_overrides(|key| (key == "TIDELINE_MAX_COMMITS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("TIDELINE_MAX_COMMITS"));
    }
}
