use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EstrannaiseError;
use crate::simulator::parameters::{ParameterTable, PkParameters};

/// A delivery product with its own calibrated PK parameter set
///
/// The string tags are shared with the dose-history records of the storage layer,
/// see [Formulation::tag].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Formulation {
    /// Estradiol benzoate, intramuscular
    #[serde(rename = "EB im")]
    EbIm,
    /// Estradiol valerate, intramuscular
    #[serde(rename = "EV im")]
    EvIm,
    /// Estradiol enanthate, intramuscular
    #[serde(rename = "EEn im")]
    EEnIm,
    /// Estradiol cypionate, intramuscular
    #[serde(rename = "EC im")]
    EcIm,
    /// Estradiol undecylate, intramuscular
    #[serde(rename = "EUn im")]
    EUnIm,
    /// Estradiol undecylate in castor oil, subcutaneous depot
    #[serde(rename = "EUn casubq")]
    EUnCasubq,
    /// Transdermal patch, changed twice weekly
    #[serde(rename = "patch tw")]
    PatchTw,
    /// Transdermal patch, changed once weekly
    #[serde(rename = "patch ow")]
    PatchOw,
}

impl Formulation {
    /// Every formulation, in table order
    pub const ALL: [Formulation; 8] = [
        Formulation::EvIm,
        Formulation::EEnIm,
        Formulation::EcIm,
        Formulation::EbIm,
        Formulation::EUnIm,
        Formulation::EUnCasubq,
        Formulation::PatchTw,
        Formulation::PatchOw,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Formulation::EbIm => "EB im",
            Formulation::EvIm => "EV im",
            Formulation::EEnIm => "EEn im",
            Formulation::EcIm => "EC im",
            Formulation::EUnIm => "EUn im",
            Formulation::EUnCasubq => "EUn casubq",
            Formulation::PatchTw => "patch tw",
            Formulation::PatchOw => "patch ow",
        }
    }

    /// Position of the formulation in [Formulation::ALL]
    pub(crate) fn index(self) -> usize {
        match self {
            Formulation::EvIm => 0,
            Formulation::EEnIm => 1,
            Formulation::EcIm => 2,
            Formulation::EbIm => 3,
            Formulation::EUnIm => 4,
            Formulation::EUnCasubq => 5,
            Formulation::PatchTw => 6,
            Formulation::PatchOw => 7,
        }
    }

    /// Whether the formulation is a transdermal patch
    pub fn is_patch(&self) -> bool {
        matches!(self, Formulation::PatchTw | Formulation::PatchOw)
    }

    /// The built-in PK parameters of this formulation
    pub fn parameters(self) -> &'static PkParameters {
        ParameterTable::builtin().get(self)
    }
}

impl FromStr for Formulation {
    type Err = EstrannaiseError;

    /// Tags must match exactly, including case and spacing
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formulation::ALL
            .into_iter()
            .find(|f| f.tag() == s)
            .ok_or_else(|| EstrannaiseError::UnknownFormulation(s.to_string()))
    }
}

impl fmt::Display for Formulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for formulation in Formulation::ALL {
            let parsed: Formulation = formulation.tag().parse().unwrap();
            assert_eq!(parsed, formulation);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "EV oral".parse::<Formulation>().unwrap_err();
        assert!(matches!(err, EstrannaiseError::UnknownFormulation(ref tag) if tag == "EV oral"));
    }

    #[test]
    fn tags_match_exactly() {
        for tag in [" EV im", "EV im ", "ev im", "EV  im", "Patch tw"] {
            assert!(
                matches!(tag.parse::<Formulation>(), Err(EstrannaiseError::UnknownFormulation(ref t)) if t == tag),
                "{:?} should be rejected",
                tag
            );
        }
    }

    #[test]
    fn serde_uses_storage_tags() {
        let json = serde_json::to_string(&Formulation::EUnCasubq).unwrap();
        assert_eq!(json, "\"EUn casubq\"");
        let back: Formulation = serde_json::from_str("\"patch ow\"").unwrap();
        assert_eq!(back, Formulation::PatchOw);
    }

    #[test]
    fn index_matches_table_order() {
        for (i, formulation) in Formulation::ALL.into_iter().enumerate() {
            assert_eq!(formulation.index(), i);
        }
    }

    #[test]
    fn only_patches_are_patches() {
        let patches: Vec<_> = Formulation::ALL.iter().filter(|f| f.is_patch()).collect();
        assert_eq!(patches, vec![&Formulation::PatchTw, &Formulation::PatchOw]);
    }
}
