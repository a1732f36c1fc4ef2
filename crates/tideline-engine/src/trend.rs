//! Trend fitting over an evolution series.

use tideline_core::{
    ConfidenceRank, EvolutionSeries, ExposureLevel, QualityPattern, ThresholdConfig,
    TidelineError, TrendResult, DAYS_PER_MONTH,
};

/// Shortest series a trend is computed for.
pub const MIN_SERIES_LEN: usize = 3;

/// Confidence ceiling for series shorter than the low-confidence bound.
const LOW_CONFIDENCE_CAP: f64 = 0.4;

const LOW_CONFIDENCE_WARNING: &str = "Low confidence due to limited commit history";

/// Fit the complexity trend of `series`.
///
/// The slope is the least-squares fit of complexity against the snapshot
/// index, so one unit on the x axis is one commit. Growth compares the mean
/// of the last `mean_window` points to the mean of the first `mean_window`.
///
/// # Errors
///
/// Returns [`TidelineError::InsufficientData`] for fewer than
/// [`MIN_SERIES_LEN`] snapshots.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use tideline_core::{EvolutionSeries, ExposureLevel, Snapshot, ThresholdConfig};
/// use tideline_engine::trend::compute;
///
/// let start = Utc::now() - Duration::days(10);
/// let snapshots = (1..=5)
///     .map(|c| Snapshot {
///         timestamp: start + Duration::days(c.into()),
///         complexity: c,
///         lines_of_code: 10,
///         function_count: 1,
///         class_count: 0,
///         author: "alice".into(),
///         commit_id: format!("{c:040}"),
///     })
///     .collect();
/// let series = EvolutionSeries::new("app.py", snapshots);
///
/// let trend = compute(&series, 180, &ThresholdConfig::default()).unwrap();
/// assert!((trend.slope - 1.0).abs() < 1e-9);
/// assert_eq!(trend.decay_forecast, 0.0);
/// assert_eq!(trend.exposure_level, ExposureLevel::Low);
/// ```
pub fn compute(
    series: &EvolutionSeries,
    window_days: u32,
    thresholds: &ThresholdConfig,
) -> Result<TrendResult, TidelineError> {
    let n = series.len();
    if n < MIN_SERIES_LEN {
        return Err(TidelineError::InsufficientData {
            found: n,
            required: MIN_SERIES_LEN,
        });
    }

    let snapshots = series.snapshots();
    let values: Vec<f64> = snapshots.iter().map(|s| f64::from(s.complexity)).collect();

    let slope = least_squares_slope(&values);
    let growth_rate = growth_rate(&values, thresholds.mean_window);
    let decay_forecast = (growth_rate * 2.0).clamp(0.0, 1.0);

    let mut confidence = confidence_for_len(n);
    let confidence_warning = if n < thresholds.low_confidence_below {
        confidence = confidence.min(LOW_CONFIDENCE_CAP);
        Some(LOW_CONFIDENCE_WARNING.to_string())
    } else {
        None
    };

    let current_complexity = snapshots.last().map_or(0, |s| s.complexity);
    let months = f64::from(window_days) / DAYS_PER_MONTH;
    let change_frequency = if months > 0.0 { n as f64 / months } else { 0.0 };

    Ok(TrendResult {
        file_path: series.file_path().to_string(),
        window_days,
        commits_evaluated: n,
        slope,
        current_complexity,
        growth_rate,
        decay_forecast,
        exposure_level: ExposureLevel::from_forecast(decay_forecast, thresholds),
        confidence_score: ConfidenceRank::new(confidence)?,
        confidence_warning,
        quality_pattern: QualityPattern::from_slope(slope, thresholds.pattern_slope),
        author_count: series.author_count(),
        change_frequency,
        timetable: snapshots.to_vec(),
    })
}

/// Slope of the degree-1 least-squares fit of `values` against `0..n`.
///
/// Returns 0.0 for fewer than two points.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        0.0
    } else {
        sxy / sxx
    }
}

/// Relative change from the head mean to the tail mean.
fn growth_rate(values: &[f64], window: usize) -> f64 {
    let window = window.clamp(1, values.len().max(1));
    let historical = mean(&values[..window]);
    let recent = mean(&values[values.len() - window..]);
    if historical > 0.0 {
        (recent - historical) / historical
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Confidence tier for a series of `n` points.
pub fn confidence_for_len(n: usize) -> f64 {
    match n {
        10.. => 0.9,
        7..=9 => 0.75,
        5..=6 => 0.6,
        _ => 0.4,
    }
}
