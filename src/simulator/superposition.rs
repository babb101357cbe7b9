//! Multi-dose prediction by linear superposition
//!
//! The absorption model is linear and time invariant, so the concentration after many doses
//! is the sum of the single-dose responses, each shifted to the time its dose was given.
//! Doses may belong to different formulations.
//!
//! All functions here are pure: the same inputs always give the same output, and any
//! number of threads may evaluate them at once.

use serde::{Deserialize, Serialize};

use super::parameters::ParameterTable;
use super::response::{respond, Release};
use crate::data::Formulation;

/// How dose times are to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Each time is the moment the dose was given
    #[default]
    Absolute,
    /// Each time is the delay since the previous dose; the first is taken as is
    Intervals,
}

/// Convert dose times to absolute timestamps
///
/// In [TimeMode::Intervals] the first timestamp equals `times[0]` and every later one is
/// the previous timestamp plus its delta.
pub fn absolute_times(times: &[f64], mode: TimeMode) -> Vec<f64> {
    resolve_times(times.iter().copied(), mode).collect()
}

/// Lazy form of [absolute_times]
pub(crate) fn resolve_times<I>(times: I, mode: TimeMode) -> impl Iterator<Item = f64>
where
    I: IntoIterator<Item = f64>,
{
    times.into_iter().scan(0.0, move |clock, time| {
        match mode {
            TimeMode::Absolute => *clock = time,
            TimeMode::Intervals => *clock += time,
        }
        Some(*clock)
    })
}

/// Concentration at `t` from doses given as parallel slices
///
/// Every dose is multiplied by `conversion_factor` before evaluation; `t` is not. An index
/// without a matching formulation or time is skipped.
pub fn multidose(
    t: f64,
    doses: &[f64],
    times: &[f64],
    formulations: &[Formulation],
    conversion_factor: f64,
    mode: TimeMode,
) -> f64 {
    multidose_with(
        ParameterTable::builtin(),
        t,
        doses,
        times,
        formulations.iter().map(|f| Some(*f)),
        conversion_factor,
        mode,
    )
}

/// Same as [multidose], with formulations given by their storage tags
///
/// Doses whose tag is not recognized are skipped rather than rejected.
pub fn multidose_tags<S: AsRef<str>>(
    t: f64,
    doses: &[f64],
    times: &[f64],
    tags: &[S],
    conversion_factor: f64,
    mode: TimeMode,
) -> f64 {
    let formulations = tags.iter().map(|tag| {
        let parsed = tag.as_ref().parse::<Formulation>().ok();
        if parsed.is_none() {
            tracing::debug!("Skipping dose with unknown formulation '{}'", tag.as_ref());
        }
        parsed
    });
    multidose_with(
        ParameterTable::builtin(),
        t,
        doses,
        times,
        formulations,
        conversion_factor,
        mode,
    )
}

/// Superposition against an explicit parameter table
pub fn multidose_with(
    table: &ParameterTable,
    t: f64,
    doses: &[f64],
    times: &[f64],
    formulations: impl IntoIterator<Item = Option<Formulation>>,
    conversion_factor: f64,
    mode: TimeMode,
) -> f64 {
    let mut times = resolve_times(times.iter().copied(), mode);
    let mut formulations = formulations.into_iter();
    let mut total = 0.0;

    for (idx, dose) in doses.iter().enumerate() {
        // Both advance on every dose so that skipped doses still count towards intervals.
        let time = times.next();
        let Some(formulation) = formulations.next().flatten() else {
            tracing::debug!("Skipping dose {} without a formulation", idx);
            continue;
        };
        let Some(time) = time else {
            tracing::debug!("Skipping dose {} without a time", idx);
            continue;
        };
        total += respond(
            t - time,
            conversion_factor * dose,
            table.get(formulation),
            Release::Simple,
        );
    }

    total
}

/// Contribution of a single dose event, with the conversion factor applied to the dose
/// and to any depot fractions
pub(crate) fn contribution(
    table: &ParameterTable,
    t: f64,
    time: f64,
    amount: f64,
    formulation: Formulation,
    release: Release,
    conversion_factor: f64,
) -> f64 {
    respond(
        t - time,
        conversion_factor * amount,
        table.get(formulation),
        release.scaled(conversion_factor),
    )
}
