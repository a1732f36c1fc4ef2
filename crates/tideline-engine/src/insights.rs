//! Threshold-triggered insights.

use chrono::{DateTime, Utc};
use tideline_core::{Insight, InsightKind, ThresholdConfig, TrendResult};

/// Confidence attached to insights from a full-confidence trend.
const BASE_CONFIDENCE: f64 = 0.85;

/// Quality-decay insights are slightly less certain than growth ones.
const DECAY_CONFIDENCE_FACTOR: f64 = 0.95;

/// Derive insights from a trend, most severe first.
///
/// A `complexity_growth` insight fires when the slope exceeds
/// `growth_slope`; a `quality_decay` insight fires when the decay forecast
/// exceeds `decay_insight`. When the trend carries a low-confidence warning,
/// its confidence score replaces the base confidence.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tideline_core::{ConfidenceRank, ExposureLevel, QualityPattern, ThresholdConfig, TrendResult};
/// use tideline_engine::insights::derive;
///
/// let trend = TrendResult {
///     file_path: "app.py".into(),
///     window_days: 180,
///     commits_evaluated: 12,
///     slope: 1.2,
///     current_complexity: 30,
///     growth_rate: 0.1,
///     decay_forecast: 0.2,
///     exposure_level: ExposureLevel::Low,
///     confidence_score: ConfidenceRank::new(0.9).unwrap(),
///     confidence_warning: None,
///     quality_pattern: QualityPattern::Declining,
///     author_count: 2,
///     change_frequency: 2.0,
///     timetable: vec![],
/// };
/// let insights = derive(&trend, &ThresholdConfig::default(), Utc::now());
/// assert_eq!(insights.len(), 1);
/// assert_eq!(insights[0].description, "Complexity growing rapidly (+1.2/month)");
/// ```
pub fn derive(
    trend: &TrendResult,
    thresholds: &ThresholdConfig,
    detected_at: DateTime<Utc>,
) -> Vec<Insight> {
    let base = if trend.is_low_confidence() {
        trend.confidence_score.value()
    } else {
        BASE_CONFIDENCE
    };

    let mut insights = Vec::new();

    if trend.slope > thresholds.growth_slope {
        insights.push(Insight {
            file_path: trend.file_path.clone(),
            kind: InsightKind::ComplexityGrowth,
            severity: (trend.slope / 2.0).min(1.0),
            description: format!("Complexity growing rapidly (+{:.1}/month)", trend.slope),
            confidence: base,
            detected_at,
        });
    }

    if trend.decay_forecast > thresholds.decay_insight {
        insights.push(Insight {
            file_path: trend.file_path.clone(),
            kind: InsightKind::QualityDecay,
            severity: trend.decay_forecast,
            description: format!(
                "High risk of quality decay ({:.0}%)",
                trend.decay_forecast * 100.0
            ),
            confidence: base * DECAY_CONFIDENCE_FACTOR,
            detected_at,
        });
    }

    insights.sort_by(|a, b| b.severity.total_cmp(&a.severity));
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_series;
    use crate::trend::compute;

    fn insights_for(complexities: &[u32]) -> Vec<Insight> {
        let thresholds = ThresholdConfig::default();
        let trend = compute(&make_series(complexities), 180, &thresholds).unwrap();
        derive(&trend, &thresholds, Utc::now())
    }

    #[test]
    fn stable_file_has_no_insights() {
        assert!(insights_for(&[4, 4, 4, 4, 4, 4]).is_empty());
    }

    #[test]
    fn step_up_yields_decay_then_growth() {
        let insights = insights_for(&[2, 2, 2, 2, 2, 8, 8, 8, 8, 8]);
        assert_eq!(insights.len(), 2);

        assert_eq!(insights[0].kind, InsightKind::QualityDecay);
        assert_eq!(insights[0].severity, 1.0);
        assert_eq!(insights[0].description, "High risk of quality decay (100%)");
        assert!((insights[0].confidence - 0.8075).abs() < 1e-9);

        assert_eq!(insights[1].kind, InsightKind::ComplexityGrowth);
        assert!((insights[1].severity - 75.0 / 82.5 / 2.0).abs() < 1e-9);
        assert_eq!(insights[1].confidence, 0.85);
        assert_eq!(insights[1].description, "Complexity growing rapidly (+0.9/month)");
    }

    #[test]
    fn growth_severity_is_capped_at_one() {
        let insights = insights_for(&[1, 4, 7, 10, 13]);
        let growth = insights
            .iter()
            .find(|i| i.kind == InsightKind::ComplexityGrowth)
            .unwrap();
        assert_eq!(growth.severity, 1.0);
    }

    #[test]
    fn low_confidence_trends_lower_insight_confidence() {
        let insights = insights_for(&[1, 3, 5, 7]);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::ComplexityGrowth);
        assert_eq!(insights[0].confidence, 0.4);
    }

    #[test]
    fn thresholds_are_exclusive() {
        let thresholds = ThresholdConfig::default();
        let mut trend = compute(&make_series(&[1, 1, 1, 1, 1]), 180, &thresholds).unwrap();
        trend.slope = 0.5;
        trend.decay_forecast = 0.7;
        assert!(derive(&trend, &thresholds, Utc::now()).is_empty());
    }

    #[test]
    fn insights_carry_file_path_and_timestamp() {
        let thresholds = ThresholdConfig::default();
        let trend = compute(&make_series(&[1, 2, 3, 4, 5]), 180, &thresholds).unwrap();
        let at = Utc::now();
        let insights = derive(&trend, &thresholds, at);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].file_path, "app.py");
        assert_eq!(insights[0].detected_at, at);
    }
}
