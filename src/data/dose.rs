use serde::{Deserialize, Serialize};

use crate::data::Formulation;
use crate::simulator::parameters::ParameterTable;
use crate::simulator::response::Release;
use crate::simulator::superposition::{contribution, resolve_times, TimeMode};

/// A single administered dose
///
/// `time` is in days. Depending on the [TimeMode] of the owning [DoseSeries] it is either the
/// moment of administration or the delay since the previous dose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    amount: f64,
    time: f64,
    formulation: Formulation,
    #[serde(default)]
    release: Release,
}

impl DoseEvent {
    pub fn new(amount: f64, time: f64, formulation: Formulation) -> Self {
        DoseEvent {
            amount,
            time,
            formulation,
            release: Release::Simple,
        }
    }

    /// A dose with additional depot release paths
    pub fn with_release(mut self, release: Release) -> Self {
        self.release = release;
        self
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn formulation(&self) -> Formulation {
        self.formulation
    }

    pub fn release(&self) -> Release {
        self.release
    }
}

/// An unordered collection of doses evaluated together
///
/// `conversion_factor` multiplies every dose before evaluation, which is how callers move
/// predictions into their display unit or apply a calibration factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseSeries {
    events: Vec<DoseEvent>,
    conversion_factor: f64,
    #[serde(default)]
    time_mode: TimeMode,
}

impl Default for DoseSeries {
    fn default() -> Self {
        DoseSeries::new(Vec::new())
    }
}

impl DoseSeries {
    pub fn new(events: Vec<DoseEvent>) -> Self {
        DoseSeries {
            events,
            conversion_factor: 1.0,
            time_mode: TimeMode::Absolute,
        }
    }

    pub fn with_conversion_factor(mut self, conversion_factor: f64) -> Self {
        self.conversion_factor = conversion_factor;
        self
    }

    pub fn with_time_mode(mut self, time_mode: TimeMode) -> Self {
        self.time_mode = time_mode;
        self
    }

    pub fn push(&mut self, event: DoseEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[DoseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn conversion_factor(&self) -> f64 {
        self.conversion_factor
    }

    pub fn time_mode(&self) -> TimeMode {
        self.time_mode
    }

    /// Administration time of every dose, in event order
    pub fn absolute_times(&self) -> Vec<f64> {
        self.resolved_times().collect()
    }

    fn resolved_times(&self) -> impl Iterator<Item = f64> + '_ {
        resolve_times(self.events.iter().map(|e| e.time), self.time_mode)
    }

    /// The same doses with absolute times
    pub fn to_absolute(&self) -> DoseSeries {
        let events = self
            .events
            .iter()
            .zip(self.resolved_times())
            .map(|(event, time)| DoseEvent { time, ..*event })
            .collect();
        DoseSeries {
            events,
            conversion_factor: self.conversion_factor,
            time_mode: TimeMode::Absolute,
        }
    }

    /// Superposed concentration at `t` using the built-in parameters
    pub fn concentration(&self, t: f64) -> f64 {
        self.concentration_with(ParameterTable::builtin(), t)
    }

    pub fn concentration_with(&self, table: &ParameterTable, t: f64) -> f64 {
        self.events
            .iter()
            .zip(self.resolved_times())
            .map(|(event, time)| {
                contribution(
                    table,
                    t,
                    time,
                    event.amount,
                    event.formulation,
                    event.release,
                    self.conversion_factor,
                )
            })
            .sum()
    }

    /// Time of the first and of the last dose
    pub fn span(&self) -> Option<(f64, f64)> {
        self.resolved_times().fold(None, |acc, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
    }
}
