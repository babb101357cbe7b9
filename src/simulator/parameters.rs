use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::Formulation;
use crate::error::{EstrannaiseError, Result};

/// Calibrated constants of the three-compartment absorption model
///
/// - `d` is the dimensionless absorption-scale factor
/// - `k1`, `k2` and `k3` are first-order rate constants in days⁻¹
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PkParameters {
    pub d: f64,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
}

impl PkParameters {
    pub const fn new(d: f64, k1: f64, k2: f64, k3: f64) -> Self {
        PkParameters { d, k1, k2, k3 }
    }

    /// Whether any two rate constants are exactly equal
    #[allow(clippy::float_cmp)]
    pub fn has_coinciding_rates(&self) -> bool {
        self.k1 == self.k2 || self.k1 == self.k3 || self.k2 == self.k3
    }

    fn validate(&self, formulation: Formulation) -> Result<()> {
        for (field, value) in [("d", self.d), ("k1", self.k1), ("k2", self.k2), ("k3", self.k3)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EstrannaiseError::InvalidParameter {
                    formulation,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

const BUILTIN: [PkParameters; 8] = [
    PkParameters::new(478.0, 0.236, 4.85, 1.24),
    PkParameters::new(191.4, 0.119, 0.601, 0.402),
    PkParameters::new(246.0, 0.0825, 3.57, 0.669),
    PkParameters::new(1893.1, 0.67, 61.5, 4.34),
    PkParameters::new(471.5, 0.01729, 6.528, 2.285),
    PkParameters::new(16.15, 0.046, 0.022, 0.101),
    PkParameters::new(16.792, 0.283, 5.592, 4.3),
    PkParameters::new(59.481, 0.107, 7.842, 5.193),
];

static TABLE: ParameterTable = ParameterTable { entries: BUILTIN };

/// Read-only registry of one [PkParameters] per [Formulation]
///
/// A table always holds an entry for every formulation, so [ParameterTable::get] cannot fail.
/// Tables read from JSON are checked for completeness when they are loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    entries: [PkParameters; 8],
}

#[derive(Deserialize)]
struct TableEntry {
    formulation: String,
    #[serde(flatten)]
    parameters: PkParameters,
}

impl ParameterTable {
    /// The published fits, shared by the whole process
    pub fn builtin() -> &'static ParameterTable {
        &TABLE
    }

    pub fn get(&self, formulation: Formulation) -> &PkParameters {
        &self.entries[formulation.index()]
    }

    /// Look up a formulation by its storage tag
    ///
    /// An unrecognized tag is a configuration error and is returned as
    /// [EstrannaiseError::UnknownFormulation].
    pub fn lookup(&self, tag: &str) -> Result<&PkParameters> {
        let formulation: Formulation = tag.parse()?;
        Ok(self.get(formulation))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Formulation, &PkParameters)> {
        Formulation::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Parse a table from a JSON array of `{ "formulation", "d", "k1", "k2", "k3" }` objects
    pub fn from_json(json: &str) -> Result<ParameterTable> {
        let raw: Vec<TableEntry> = serde_json::from_str(json)?;
        let mut entries: [Option<PkParameters>; 8] = [None; 8];

        for entry in raw {
            let formulation: Formulation = entry.formulation.parse()?;
            entry.parameters.validate(formulation)?;
            let slot = &mut entries[formulation.index()];
            if slot.is_some() {
                return Err(EstrannaiseError::DuplicateFormulation(formulation));
            }
            *slot = Some(entry.parameters);
        }

        let mut table = BUILTIN;
        for formulation in Formulation::ALL {
            table[formulation.index()] = entries[formulation.index()]
                .ok_or(EstrannaiseError::MissingFormulation(formulation))?;
        }

        tracing::info!("Loaded PK parameters for {} formulations", table.len());
        Ok(ParameterTable { entries: table })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<ParameterTable> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        tracing::info!("Reading PK parameter table from {}", path.display());
        ParameterTable::from_json(&json)
    }
}

impl Default for ParameterTable {
    fn default() -> Self {
        ParameterTable::builtin().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_json(skip: Option<Formulation>, extra: Option<&str>) -> String {
        let mut items: Vec<String> = ParameterTable::builtin()
            .iter()
            .filter(|(f, _)| Some(*f) != skip)
            .map(|(f, p)| {
                format!(
                    r#"{{"formulation": "{}", "d": {}, "k1": {}, "k2": {}, "k3": {}}}"#,
                    f, p.d, p.k1, p.k2, p.k3
                )
            })
            .collect();
        if let Some(extra) = extra {
            items.push(extra.to_string());
        }
        format!("[{}]", items.join(","))
    }

    #[test]
    fn builtin_values_match_published_fits() {
        let ev = Formulation::EvIm.parameters();
        assert_eq!(*ev, PkParameters::new(478.0, 0.236, 4.85, 1.24));
        let depot = Formulation::EUnCasubq.parameters();
        assert_eq!(*depot, PkParameters::new(16.15, 0.046, 0.022, 0.101));
        let patch = Formulation::PatchOw.parameters();
        assert_eq!(*patch, PkParameters::new(59.481, 0.107, 7.842, 5.193));
    }

    #[test]
    fn builtin_is_complete_and_positive() {
        let table = ParameterTable::builtin();
        assert_eq!(table.iter().count(), Formulation::ALL.len());
        for (formulation, p) in table.iter() {
            assert!(p.validate(formulation).is_ok());
        }
    }

    #[test]
    fn builtin_table_is_one_shared_static() {
        let here = ParameterTable::builtin() as *const ParameterTable as usize;
        let there = std::thread::spawn(|| ParameterTable::builtin() as *const ParameterTable as usize)
            .join()
            .unwrap();
        assert_eq!(here, there);
        assert_eq!(ParameterTable::default(), *ParameterTable::builtin());
    }

    #[test]
    fn lookup_by_tag() {
        let table = ParameterTable::builtin();
        assert_eq!(table.lookup("EC im").unwrap().d, 246.0);
        assert!(matches!(
            table.lookup("EV oral"),
            Err(EstrannaiseError::UnknownFormulation(_))
        ));
    }

    #[test]
    fn json_round_trip_of_builtin() {
        let table = ParameterTable::from_json(&table_json(None, None)).unwrap();
        assert_eq!(&table, ParameterTable::builtin());
    }

    #[test]
    fn json_missing_entry_is_rejected() {
        let err = ParameterTable::from_json(&table_json(Some(Formulation::PatchTw), None)).unwrap_err();
        assert!(matches!(
            err,
            EstrannaiseError::MissingFormulation(Formulation::PatchTw)
        ));
    }

    #[test]
    fn json_duplicate_entry_is_rejected() {
        let extra = r#"{"formulation": "EV im", "d": 1.0, "k1": 1.0, "k2": 2.0, "k3": 3.0}"#;
        let err = ParameterTable::from_json(&table_json(None, Some(extra))).unwrap_err();
        assert!(matches!(
            err,
            EstrannaiseError::DuplicateFormulation(Formulation::EvIm)
        ));
    }

    #[test]
    fn json_non_positive_constant_is_rejected() {
        let extra = r#"{"formulation": "EB im", "d": 1.0, "k1": 0.0, "k2": 2.0, "k3": 3.0}"#;
        let err = ParameterTable::from_json(&table_json(Some(Formulation::EbIm), Some(extra)))
            .unwrap_err();
        assert!(matches!(
            err,
            EstrannaiseError::InvalidParameter { field: "k1", .. }
        ));
    }

    #[test]
    fn json_unknown_tag_is_rejected() {
        let extra = r#"{"formulation": "EV oral", "d": 1.0, "k1": 1.0, "k2": 2.0, "k3": 3.0}"#;
        let err = ParameterTable::from_json(&table_json(None, Some(extra))).unwrap_err();
        assert!(matches!(err, EstrannaiseError::UnknownFormulation(_)));
    }

    #[test]
    fn coinciding_rates() {
        assert!(!Formulation::EvIm.parameters().has_coinciding_rates());
        assert!(PkParameters::new(1.0, 2.0, 3.0, 2.0).has_coinciding_rates());
    }
}
