use thiserror::Error;

use crate::data::Formulation;
use crate::units::UnitError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, EstrannaiseError>;

#[derive(Error, Debug)]
pub enum EstrannaiseError {
    /// A formulation tag that is not part of the parameter table
    #[error("Unknown formulation '{0}'")]
    UnknownFormulation(String),

    /// A parameter table is missing an entry
    #[error("Parameter table has no entry for formulation '{0}'")]
    MissingFormulation(Formulation),

    /// A parameter table defines the same formulation twice
    #[error("Parameter table defines formulation '{0}' more than once")]
    DuplicateFormulation(Formulation),

    /// A PK constant is zero, negative or not finite
    #[error("Invalid parameter {field} = {value} for formulation '{formulation}'")]
    InvalidParameter {
        formulation: Formulation,
        field: &'static str,
        value: f64,
    },

    /// Steady state requested for coinciding rate constants
    #[error("Steady state is undefined for coinciding rate constants (k1 = {k1}, k2 = {k2}, k3 = {k3})")]
    DegenerateSteadyState { k1: f64, k2: f64, k3: f64 },

    /// Dosing period must be finite and strictly positive
    #[error("Invalid dosing period: {0}")]
    InvalidPeriod(f64),

    /// Sampling grid cannot be built
    #[error("Invalid time grid: {reason}")]
    InvalidGrid { reason: String },

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
