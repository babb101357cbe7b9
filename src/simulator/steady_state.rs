use super::parameters::PkParameters;
use super::response::RateCoincidence;
use crate::error::{EstrannaiseError, Result};

/// Long-run periodic concentration under identical doses repeated every `period` days
///
/// `t` is folded into a phase `φ ∈ [0, period)` and each exponential mode `e^{-k·t}` of the
/// all-distinct response is replaced by the periodic kernel `e^{-k·φ} / (1 - e^{-k·period})`,
/// which is the closed form of summing the mode over infinitely many past doses.
///
/// The rate constants must be pairwise distinct. Coinciding constants divide by zero and
/// are not handled here; use [SteadyState::new] to have them rejected.
pub fn steady_state(t: f64, dose: f64, period: f64, p: &PkParameters) -> f64 {
    let PkParameters { d, k1, k2, k3 } = *p;
    let phase = t - period * (t / period).floor();
    let kernel = |k: f64| (-k * phase).exp() / (1.0 - (-k * period).exp());

    dose * d
        * k1
        * k2
        * (kernel(k1) / (k1 - k2) / (k1 - k3) - kernel(k2) / (k1 - k2) / (k2 - k3)
            + kernel(k3) / (k1 - k3) / (k2 - k3))
}

/// A validated steady-state query for one parameter set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyState {
    parameters: PkParameters,
    period: f64,
}

impl SteadyState {
    /// Reject periods that are not finite and positive, and coinciding rate constants
    pub fn new(parameters: PkParameters, period: f64) -> Result<Self> {
        if !period.is_finite() || period <= 0.0 {
            return Err(EstrannaiseError::InvalidPeriod(period));
        }
        if RateCoincidence::of(&parameters) != RateCoincidence::Distinct {
            return Err(EstrannaiseError::DegenerateSteadyState {
                k1: parameters.k1,
                k2: parameters.k2,
                k3: parameters.k3,
            });
        }
        Ok(SteadyState { parameters, period })
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn parameters(&self) -> &PkParameters {
        &self.parameters
    }

    /// Concentration at phase `t` for a repeated dose of `dose`
    pub fn at(&self, t: f64, dose: f64) -> f64 {
        steady_state(t, dose, self.period, &self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Formulation;
    use crate::simulator::response::{respond, Release};
    use approx::assert_relative_eq;

    #[test]
    fn periodic_in_t() {
        for formulation in Formulation::ALL {
            let p = formulation.parameters();
            let period = 7.0;
            for t in [0.3, 2.0, 5.5, 6.9, 13.1] {
                assert_relative_eq!(
                    steady_state(t, 4.0, period, p),
                    steady_state(t + period, 4.0, period, p),
                    max_relative = 1e-9
                );
            }
        }
    }

    #[test]
    fn negative_phase_folds_into_period() {
        let p = Formulation::EvIm.parameters();
        assert_relative_eq!(
            steady_state(-2.0, 5.0, 7.0, p),
            steady_state(5.0, 5.0, 7.0, p),
            max_relative = 1e-9
        );
    }

    #[test]
    fn matches_long_superposition() {
        let p = Formulation::EvIm.parameters();
        let period = 5.0;
        let dose = 4.0;
        let n = 400;
        let t_last = (n - 1) as f64 * period;
        for phase in [0.5, 1.0, 2.5, 4.0] {
            let summed: f64 = (0..n)
                .map(|i| respond(t_last + phase - i as f64 * period, dose, p, Release::Simple))
                .sum();
            assert_relative_eq!(steady_state(phase, dose, period, p), summed, max_relative = 1e-6);
        }
    }

    #[test]
    fn linear_in_dose() {
        let p = Formulation::EcIm.parameters();
        assert_relative_eq!(
            steady_state(1.5, 6.0, 7.0, p),
            2.0 * steady_state(1.5, 3.0, 7.0, p),
            max_relative = 1e-12
        );
    }

    #[test]
    fn validated_query() {
        let p = *Formulation::EEnIm.parameters();
        let ss = SteadyState::new(p, 10.0).unwrap();
        assert_eq!(ss.period(), 10.0);
        assert_eq!(ss.at(3.0, 5.0), steady_state(3.0, 5.0, 10.0, &p));
    }

    #[test]
    fn rejects_invalid_period() {
        let p = *Formulation::EEnIm.parameters();
        for period in [0.0, -7.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SteadyState::new(p, period),
                Err(EstrannaiseError::InvalidPeriod(_))
            ));
        }
    }

    #[test]
    fn rejects_coinciding_rates() {
        let p = PkParameters::new(1.0, 2.0, 2.0, 3.0);
        assert!(matches!(
            SteadyState::new(p, 7.0),
            Err(EstrannaiseError::DegenerateSteadyState { .. })
        ));
    }
}
