//! Per-person calibration of predicted curves against blood tests
//!
//! A fudge factor is the ratio of a measured level to the level the model predicted for the
//! same date. Predictions are multiplied by a factor taken from the dated series of such
//! ratios, either interpolated between tests or held from the most recent test.

use serde::{Deserialize, Serialize};

/// Ratio of a measurement to its prediction, rounded to three decimals
///
/// Falls back to 1.0 when there is no usable prediction.
pub fn fudge_factor(measured: f64, predicted: Option<f64>) -> f64 {
    let Some(predicted) = predicted.filter(|p| *p > 0.0) else {
        tracing::warn!("No positive prediction to calibrate against, using 1.0");
        return 1.0;
    };
    let ratio = measured / predicted;
    if ratio.is_finite() {
        (ratio * 1000.0).round() / 1000.0
    } else {
        tracing::warn!("Calibration ratio {} / {} is not finite, using 1.0", measured, predicted);
        1.0
    }
}

/// Fudge factors keyed by date, kept sorted by date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FudgeSeries {
    points: Vec<(i64, f64)>,
}

impl FudgeSeries {
    pub fn new(mut points: Vec<(i64, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        FudgeSeries { points }
    }

    pub fn points(&self) -> &[(i64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Linear interpolation between neighbouring factors, clamped to the first and last
    pub fn blended(&self, date: i64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 1.0;
        };
        if date <= first.0 {
            return first.1;
        }
        if date >= last.0 {
            return last.1;
        }
        for window in self.points.windows(2) {
            let (prev_date, prev) = window[0];
            let (next_date, next) = window[1];
            if date <= next_date {
                let span = (next_date - prev_date) as f64;
                if span <= 0.0 {
                    return prev;
                }
                let ratio = (date - prev_date) as f64 / span;
                return prev + (next - prev) * ratio;
            }
        }
        last.1
    }

    /// Factor of the most recent test at or before `date`; the first factor before any test
    pub fn stepped(&self, date: i64) -> f64 {
        let Some(first) = self.points.first() else {
            return 1.0;
        };
        if date <= first.0 {
            return first.1;
        }
        self.points
            .iter()
            .take_while(|(d, _)| *d <= date)
            .last()
            .map_or(first.1, |(_, factor)| *factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fudge_factor_rounds() {
        assert_eq!(fudge_factor(150.0, Some(100.0)), 1.5);
        assert_eq!(fudge_factor(100.0, Some(300.0)), 0.333);
    }

    #[test]
    fn fudge_factor_without_prediction() {
        assert_eq!(fudge_factor(150.0, None), 1.0);
        assert_eq!(fudge_factor(150.0, Some(0.0)), 1.0);
        assert_eq!(fudge_factor(f64::INFINITY, Some(2.0)), 1.0);
    }

    #[test]
    fn empty_series_is_neutral() {
        let series = FudgeSeries::default();
        assert_eq!(series.blended(10), 1.0);
        assert_eq!(series.stepped(10), 1.0);
    }

    #[test]
    fn blended_interpolates_and_clamps() {
        let series = FudgeSeries::new(vec![(100, 2.0), (0, 1.0)]);
        assert_eq!(series.points()[0], (0, 1.0));
        assert_eq!(series.blended(-50), 1.0);
        assert_relative_eq!(series.blended(25), 1.25);
        assert_eq!(series.blended(500), 2.0);
    }

    #[test]
    fn stepped_holds_last_factor() {
        let series = FudgeSeries::new(vec![(0, 1.0), (100, 2.0), (200, 0.5)]);
        assert_eq!(series.stepped(-10), 1.0);
        assert_eq!(series.stepped(50), 1.0);
        assert_eq!(series.stepped(100), 2.0);
        assert_eq!(series.stepped(199), 2.0);
        assert_eq!(series.stepped(1000), 0.5);
    }

    #[test]
    fn duplicate_dates_do_not_divide_by_zero() {
        let series = FudgeSeries::new(vec![(0, 1.0), (100, 2.0), (100, 3.0), (200, 4.0)]);
        assert!(series.blended(100).is_finite());
        assert!(series.blended(150).is_finite());
    }
}
