use serde::{Deserialize, Serialize};

use super::parameters::PkParameters;

/// Absorption path of a single dose
///
/// Transdermal products may release part of the dose through paths that bypass the
/// main absorption chain. These are modelled as additive terms on top of the
/// three-compartment response.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Release {
    /// Only the three-compartment absorption chain
    #[default]
    Simple,
    /// Absorption chain plus an instant-release term and a secondary depot
    Depot {
        /// Weight of the term decaying with `k3` from `t = 0`
        instant_fraction: f64,
        /// Weight of the one-step depot feeding through `k2`
        secondary_fraction: f64,
    },
}

impl Release {
    /// Multiply the release fractions by `factor`
    pub fn scaled(self, factor: f64) -> Release {
        match self {
            Release::Simple => Release::Simple,
            Release::Depot {
                instant_fraction,
                secondary_fraction,
            } => Release::Depot {
                instant_fraction: instant_fraction * factor,
                secondary_fraction: secondary_fraction * factor,
            },
        }
    }
}

/// Which rate constants of a parameter set are exactly equal
///
/// Exact equality is transitive for finite values, so two equalities imply the third
/// and the five cases below are exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCoincidence {
    /// k1 = k2 = k3
    All,
    /// k1 = k2 ≠ k3
    FirstSecond,
    /// k1 = k3 ≠ k2
    FirstThird,
    /// k2 = k3 ≠ k1
    SecondThird,
    /// All rate constants differ
    Distinct,
}

impl RateCoincidence {
    #[allow(clippy::float_cmp)]
    pub fn of(p: &PkParameters) -> Self {
        match (p.k1 == p.k2, p.k1 == p.k3, p.k2 == p.k3) {
            (true, _, true) | (true, true, _) | (_, true, true) => RateCoincidence::All,
            (true, false, false) => RateCoincidence::FirstSecond,
            (false, true, false) => RateCoincidence::FirstThird,
            (false, false, true) => RateCoincidence::SecondThird,
            (false, false, false) => RateCoincidence::Distinct,
        }
    }
}

/// Concentration contributed by one dose, `t` days after it was given
///
/// The dose enters an absorption chain with first-order rate constants `k1`, `k2` and `k3`.
/// The central compartment follows a sum of exponentials scaled by `dose·d·k1·k2`. When
/// rate constants coincide the partial-fraction form divides by zero, so the matching
/// limiting form is used instead.
///
/// - Returns exactly 0 for `t < 0`
/// - Returns 0 when the result is not finite
/// - Returns exactly 0 at `t = 0` for [Release::Simple]
pub fn respond(t: f64, dose: f64, p: &PkParameters, release: Release) -> f64 {
    if t < 0.0 {
        return 0.0;
    }

    let PkParameters { d, k1, k2, k3 } = *p;
    let mut ret = 0.0;

    if let Release::Depot {
        instant_fraction,
        secondary_fraction,
    } = release
    {
        if instant_fraction > 0.0 {
            ret += instant_fraction * (-k3 * t).exp();
        }
        if secondary_fraction > 0.0 {
            ret += secondary_depot(t, secondary_fraction, k2, k3);
        }
    }

    if dose > 0.0 && d > 0.0 {
        ret += dose * d * k1 * k2 * absorption_chain(t, p);
    }

    if ret.is_finite() {
        ret
    } else {
        0.0
    }
}

#[allow(clippy::float_cmp)]
fn secondary_depot(t: f64, fraction: f64, k2: f64, k3: f64) -> f64 {
    if k2 == k3 {
        fraction * k2 * t * (-k2 * t).exp()
    } else {
        fraction * k2 / (k2 - k3) * ((-k3 * t).exp() - (-k2 * t).exp())
    }
}

/// Unit-scale response of the absorption chain, before multiplying by `dose·d·k1·k2`
pub(crate) fn absorption_chain(t: f64, p: &PkParameters) -> f64 {
    let PkParameters { k1, k2, k3, .. } = *p;
    let e1 = (-k1 * t).exp();
    let e2 = (-k2 * t).exp();
    let e3 = (-k3 * t).exp();

    match RateCoincidence::of(p) {
        RateCoincidence::All => t * t * e1 / 2.0,
        RateCoincidence::FirstSecond => {
            let dk = k1 - k3;
            (e3 - e1 * (1.0 + dk * t)) / (dk * dk)
        }
        RateCoincidence::FirstThird => {
            let dk = k1 - k2;
            (e2 - e1 * (1.0 + dk * t)) / (dk * dk)
        }
        RateCoincidence::SecondThird => {
            let dk = k1 - k2;
            (e1 - e2 * (1.0 - dk * t)) / (dk * dk)
        }
        // Partial fractions regrouped around e3; vanishes exactly at t = 0.
        RateCoincidence::Distinct => ((e1 - e3) / (k1 - k3) - (e2 - e3) / (k2 - k3)) / (k1 - k2),
    }
}

/// The textbook partial-fraction form of the all-distinct response
#[cfg(test)]
pub(crate) fn partial_fractions(t: f64, p: &PkParameters) -> f64 {
    let PkParameters { k1, k2, k3, .. } = *p;
    (-k1 * t).exp() / (k1 - k2) / (k1 - k3) - (-k2 * t).exp() / (k1 - k2) / (k2 - k3)
        + (-k3 * t).exp() / (k1 - k3) / (k2 - k3)
}
