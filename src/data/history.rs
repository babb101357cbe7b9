//! Dose and blood-test records shared with the storage layer
//!
//! Records carry unix timestamps in milliseconds. They are turned into a [DoseSeries] in days
//! counted from a chosen origin, usually the first injection.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::{DoseEvent, DoseSeries, Formulation};
use crate::error::Result;
use crate::simulator::calibration::{fudge_factor, FudgeSeries};
use crate::simulator::curve::{time_grid, Curve};
use crate::units::convert_estradiol;

/// Milliseconds in a day
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Unit in which predictions from dose records are expressed
pub const PREDICTION_UNIT: &str = "pg/mL";

/// Injectable estradiol products as named in dose records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectableEster {
    #[serde(rename = "Estradiol Benzoate")]
    Benzoate,
    #[serde(rename = "Estradiol Cypionate")]
    Cypionate,
    #[serde(rename = "Estradiol Enanthate")]
    Enanthate,
    #[serde(rename = "Estradiol Undecylate")]
    Undecylate,
    #[serde(rename = "Estradiol Valerate")]
    Valerate,
    #[serde(rename = "Polyestradiol Phosphate")]
    PolyestradiolPhosphate,
}

impl InjectableEster {
    /// The intramuscular formulation modelling this ester, if there is one
    pub fn formulation(&self) -> Option<Formulation> {
        match self {
            InjectableEster::Benzoate => Some(Formulation::EbIm),
            InjectableEster::Valerate => Some(Formulation::EvIm),
            InjectableEster::Enanthate => Some(Formulation::EEnIm),
            InjectableEster::Cypionate => Some(Formulation::EcIm),
            InjectableEster::Undecylate => Some(Formulation::EUnIm),
            InjectableEster::PolyestradiolPhosphate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum InjectableMarker {
    #[serde(rename = "injectableEstradiol")]
    InjectableEstradiol,
}

/// An injectable estradiol dose as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectableDose {
    medication_type: InjectableMarker,
    pub date: i64,
    #[serde(rename = "type")]
    pub kind: InjectableEster,
    pub dose: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Stored fields that play no part in prediction, such as `unit` or `note`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InjectableDose {
    pub fn new(date: i64, kind: InjectableEster, dose: f64) -> Self {
        InjectableDose {
            medication_type: InjectableMarker::InjectableEstradiol,
            date,
            kind,
            dose,
            id: None,
            extra: Map::new(),
        }
    }
}

/// One entry of the dosage history
///
/// Only injectable estradiol is modelled. Every other record, including an injectable record
/// this crate cannot read, is kept verbatim as [DosageRecord::Other] so that a history
/// serializes back to what was loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DosageRecord {
    InjectableEstradiol(InjectableDose),
    Other(Value),
}

/// A blood test with an optional measured estradiol level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTest {
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estradiol_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estradiol_unit: Option<String>,
    /// Prediction stored with the test when it was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estrannaise_number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fudge_factor: Option<f64>,
    /// Stored fields that play no part in calibration, such as other hormone levels
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BloodTest {
    /// Measured estradiol in [PREDICTION_UNIT]
    ///
    /// Tests without a unit are taken to be in [PREDICTION_UNIT] already.
    pub fn estradiol_pg_ml(&self) -> Option<f64> {
        let level = self.estradiol_level?;
        let Some(unit) = self.estradiol_unit.as_deref() else {
            return Some(level);
        };
        match convert_estradiol(level, unit, PREDICTION_UNIT) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring blood test at {}: {}", self.date, e);
                None
            }
        }
    }
}

/// How calibration factors are applied along a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calibration {
    /// Interpolate between neighbouring blood tests
    Blended,
    /// Hold the factor of the most recent blood test
    Stepped,
}

/// Dosage history and blood tests of one person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseHistory {
    #[serde(default)]
    pub dosage_history: Vec<DosageRecord>,
    #[serde(default)]
    pub blood_tests: Vec<BloodTest>,
    /// Other top-level content of the stored document
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DoseHistory {
    pub fn from_json(json: &str) -> Result<DoseHistory> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<DoseHistory> {
        let json = fs::read_to_string(path)?;
        DoseHistory::from_json(&json)
    }

    /// Injectable estradiol records as `(date, ester, dose)`, sorted by date
    pub fn injections(&self) -> Vec<(i64, InjectableEster, f64)> {
        let mut injections: Vec<_> = self
            .dosage_history
            .iter()
            .filter_map(|record| match record {
                DosageRecord::InjectableEstradiol(injection) => {
                    Some((injection.date, injection.kind, injection.dose))
                }
                DosageRecord::Other(_) => None,
            })
            .collect();
        injections.sort_by_key(|(date, _, _)| *date);
        injections
    }

    /// Date of the first injection, modelled or not
    pub fn first_injection(&self) -> Option<i64> {
        self.injections().first().map(|(date, _, _)| *date)
    }

    /// Modelled injections as a dose series in days since `origin`
    pub fn series(&self, origin: i64) -> DoseSeries {
        let events = self
            .injections()
            .into_iter()
            .filter_map(|(date, kind, dose)| {
                let Some(formulation) = kind.formulation() else {
                    tracing::debug!("No PK model for {:?} given at {}", kind, date);
                    return None;
                };
                Some(DoseEvent::new(dose, days_between(origin, date), formulation))
            })
            .collect();
        DoseSeries::new(events)
    }

    /// Predicted estradiol in [PREDICTION_UNIT] at `date`
    ///
    /// `None` before the first injection, when no injection has a PK model, or when the
    /// prediction is not positive.
    pub fn predict_at(&self, date: i64) -> Option<f64> {
        let origin = self.first_injection()?;
        if date < origin {
            return None;
        }
        let series = self.series(origin);
        if series.is_empty() {
            return None;
        }
        let predicted = series.concentration(days_between(origin, date));
        (predicted.is_finite() && predicted > 0.0).then_some(predicted)
    }

    /// Fill in missing fudge factors of blood tests with a measured estradiol level
    ///
    /// Returns whether any test was updated.
    pub fn calibrate(&mut self) -> bool {
        let predictions: Vec<Option<f64>> = self
            .blood_tests
            .iter()
            .map(|test| self.predict_at(test.date))
            .collect();

        let mut updated = false;
        for (test, prediction) in self.blood_tests.iter_mut().zip(predictions) {
            if test.fudge_factor.is_some() {
                continue;
            }
            let Some(measured) = test.estradiol_pg_ml().filter(|m| m.is_finite()) else {
                continue;
            };
            let predicted = prediction.or(test.estrannaise_number);
            test.fudge_factor = Some(fudge_factor(measured, predicted));
            updated = true;
        }
        updated
    }

    /// Fudge factors of all calibrated blood tests
    pub fn fudge_series(&self) -> FudgeSeries {
        FudgeSeries::new(
            self.blood_tests
                .iter()
                .filter_map(|test| test.fudge_factor.map(|f| (test.date, f)))
                .collect(),
        )
    }

    /// Calibrated prediction from the first injection until `end`, `step` days apart
    ///
    /// Curve times are days since the first injection. An empty curve is returned when there
    /// are no injections.
    pub fn calibrated_curve(&self, end: i64, step: f64, calibration: Calibration) -> Result<Curve> {
        let Some(origin) = self.first_injection() else {
            return Ok(Curve::default());
        };
        let series = self.series(origin);
        let fudge = self.fudge_series();
        let times = time_grid(0.0, days_between(origin, end), step)?;
        let values = times
            .par_iter()
            .map(|&t| {
                let date = origin + (t * DAY_MS as f64) as i64;
                let factor = match calibration {
                    Calibration::Blended => fudge.blended(date),
                    Calibration::Stepped => fudge.stepped(date),
                };
                factor * series.concentration(t)
            })
            .collect();
        Ok(Curve { times, values })
    }
}

fn days_between(origin: i64, date: i64) -> f64 {
    (date - origin) as f64 / DAY_MS as f64
}
