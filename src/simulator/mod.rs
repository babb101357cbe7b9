pub mod calibration;
pub mod curve;
pub mod parameters;
pub mod response;
pub mod steady_state;
pub mod superposition;

use serde::{Deserialize, Serialize};

use crate::data::Formulation;
use crate::error::Result;
use parameters::ParameterTable;
use response::{respond, Release};
use steady_state::SteadyState;

/// How a single dose is to be evaluated
///
/// Steady state is always evaluated for the plain absorption chain, so depot terms cannot be
/// combined with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regimen", rename_all = "snake_case")]
pub enum Regimen {
    /// One dose given at `t = 0`
    Single(Release),
    /// The same dose repeated every `period` days, forever
    SteadyState { period: f64 },
}

impl Default for Regimen {
    fn default() -> Self {
        Regimen::Single(Release::Simple)
    }
}

/// Concentration at `t` for one dose of `formulation` under `regimen`
///
/// # Errors
///
/// A steady-state regimen fails with [crate::EstrannaiseError::InvalidPeriod] or
/// [crate::EstrannaiseError::DegenerateSteadyState] when it cannot be evaluated.
pub fn predict(t: f64, dose: f64, formulation: Formulation, regimen: &Regimen) -> Result<f64> {
    predict_with(ParameterTable::builtin(), t, dose, formulation, regimen)
}

pub fn predict_with(
    table: &ParameterTable,
    t: f64,
    dose: f64,
    formulation: Formulation,
    regimen: &Regimen,
) -> Result<f64> {
    let parameters = table.get(formulation);
    match *regimen {
        Regimen::Single(release) => Ok(respond(t, dose, parameters, release)),
        Regimen::SteadyState { period } => Ok(SteadyState::new(*parameters, period)?.at(t, dose)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EstrannaiseError;
    use crate::simulator::steady_state::steady_state;

    #[test]
    fn single_regimen_is_a_response() {
        let f = Formulation::EvIm;
        let value = predict(2.0, 5.0, f, &Regimen::default()).unwrap();
        assert_eq!(value, respond(2.0, 5.0, f.parameters(), Release::Simple));
    }

    #[test]
    fn steady_state_regimen() {
        let f = Formulation::EcIm;
        let value = predict(2.0, 5.0, f, &Regimen::SteadyState { period: 7.0 }).unwrap();
        assert_eq!(value, steady_state(2.0, 5.0, 7.0, f.parameters()));
    }

    #[test]
    fn steady_state_regimen_rejects_bad_period() {
        let err = predict(2.0, 5.0, Formulation::EcIm, &Regimen::SteadyState { period: 0.0 })
            .unwrap_err();
        assert!(matches!(err, EstrannaiseError::InvalidPeriod(_)));
    }

    #[test]
    fn regimen_serde() {
        let json = serde_json::to_string(&Regimen::SteadyState { period: 7.0 }).unwrap();
        assert_eq!(json, r#"{"regimen":"steady_state","period":7.0}"#);
    }
}
