//! Sampling of concentration curves over a time grid
//!
//! Every sample is independent of the others, so grids are evaluated in parallel.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::parameters::ParameterTable;
use super::steady_state::SteadyState;
use super::superposition::contribution;
use crate::data::{DoseSeries, Formulation};
use crate::error::{EstrannaiseError, Result};

/// Options for sampling a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOptions {
    /// Days between consecutive samples
    pub step: f64,
    /// Multiplier applied on top of the conversion factor of the series
    pub conversion_factor: f64,
}

impl Default for CurveOptions {
    fn default() -> Self {
        CurveOptions {
            step: 0.25,
            conversion_factor: 1.0,
        }
    }
}

impl CurveOptions {
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_conversion_factor(mut self, conversion_factor: f64) -> Self {
        self.conversion_factor = conversion_factor;
        self
    }
}

/// Sampled concentrations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time and value of the highest sample
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.samples()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    }

    /// Time and value of the lowest sample
    pub fn trough(&self) -> Option<(f64, f64)> {
        self.samples()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }

    /// Area under the sampled curve, linear trapezoidal rule
    pub fn auc(&self) -> f64 {
        self.times
            .windows(2)
            .zip(self.values.windows(2))
            .map(|(t, c)| (c[0] + c[1]) / 2.0 * (t[1] - t[0]))
            .sum()
    }

    fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

/// Largest number of samples [time_grid] will produce
pub const MAX_GRID_SAMPLES: usize = 10_000_000;

/// Times from `start` to `end` in increments of `step`
///
/// The last time is the largest grid point that does not exceed `end`. Grids of more than
/// [MAX_GRID_SAMPLES] points are rejected with [EstrannaiseError::InvalidGrid].
pub fn time_grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(EstrannaiseError::InvalidGrid {
            reason: format!("step must be finite and positive, got {}", step),
        });
    }
    if !start.is_finite() || !end.is_finite() || end < start {
        return Err(EstrannaiseError::InvalidGrid {
            reason: format!("cannot sample from {} to {}", start, end),
        });
    }
    // Tolerate rounding so that `end` itself is kept when it lies on the grid.
    let intervals = ((end - start) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_GRID_SAMPLES as f64 {
        return Err(EstrannaiseError::InvalidGrid {
            reason: format!(
                "{} to {} in steps of {} exceeds {} samples",
                start, end, step, MAX_GRID_SAMPLES
            ),
        });
    }
    let n = intervals as usize;
    Ok((0..=n).map(|i| start + i as f64 * step).collect())
}

impl DoseSeries {
    /// Sample the superposed concentration between `start` and `end`
    pub fn sample(&self, options: &CurveOptions, start: f64, end: f64) -> Result<Curve> {
        self.sample_with(ParameterTable::builtin(), options, start, end)
    }

    pub fn sample_with(
        &self,
        table: &ParameterTable,
        options: &CurveOptions,
        start: f64,
        end: f64,
    ) -> Result<Curve> {
        let times = time_grid(start, end, options.step)?;
        let series = self
            .clone()
            .with_conversion_factor(self.conversion_factor() * options.conversion_factor);
        let values = times
            .par_iter()
            .map(|&t| series.concentration_with(table, t))
            .collect();
        Ok(Curve { times, values })
    }

    /// Contribution of every dose at every time
    ///
    /// Rows follow `times` and columns follow the dose events; each row sums to the
    /// superposed concentration at that time.
    pub fn contributions(&self, times: &[f64]) -> Array2<f64> {
        self.contributions_with(ParameterTable::builtin(), times)
    }

    pub fn contributions_with(&self, table: &ParameterTable, times: &[f64]) -> Array2<f64> {
        let dose_times = self.absolute_times();
        let mut matrix = Array2::<f64>::zeros((times.len(), self.len()));
        matrix
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(times.par_iter())
            .for_each(|(mut row, &t)| {
                for (j, (event, time)) in self.events().iter().zip(&dose_times).enumerate() {
                    row[j] = contribution(
                        table,
                        t,
                        *time,
                        event.amount(),
                        event.formulation(),
                        event.release(),
                        self.conversion_factor(),
                    );
                }
            });
        matrix
    }
}

/// One period of the steady-state curve of `formulation`, sampled at `n` evenly spaced points
pub fn steady_state_curve(formulation: Formulation, dose: f64, period: f64, n: usize) -> Result<Curve> {
    let ss = SteadyState::new(*formulation.parameters(), period)?;
    if n < 2 {
        return Err(EstrannaiseError::InvalidGrid {
            reason: format!("need at least two samples per period, got {}", n),
        });
    }
    let times: Vec<f64> = (0..n).map(|i| i as f64 * period / (n - 1) as f64).collect();
    let values = times.par_iter().map(|&t| ss.at(t, dose)).collect();
    Ok(Curve { times, values })
}
