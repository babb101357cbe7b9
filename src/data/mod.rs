pub mod builder;
pub mod dose;
pub mod formulation;
pub mod history;
pub mod parser;
pub use dose::{DoseEvent, DoseSeries};
pub use formulation::Formulation;
pub use history::{BloodTest, DosageRecord, DoseHistory, InjectableDose, InjectableEster};
