//! Pharmacokinetic prediction of serum estradiol for injectable and transdermal formulations
//!
//! Every formulation is a three-compartment absorption chain with first-order rates, described
//! by four constants. A dose response has a closed form, multiple doses combine by linear
//! superposition and an indefinitely repeated dose has a closed-form steady state.
//!
//! ```rust
//! use estrannaise::prelude::*;
//!
//! let series = DoseSeries::builder()
//!     .dose(0.0, 5.0, Formulation::EvIm)
//!     .repeat(3, 7.0)
//!     .build();
//! let level = series.concentration(10.0);
//! assert!(level > 0.0);
//! ```

pub mod data;
pub mod error;
pub mod simulator;
pub mod units;

//extension traits
pub use crate::data::builder::DoseSeriesBuilderExt;
pub use crate::data::*;
pub use crate::simulator::curve::{Curve, CurveOptions};
pub use crate::simulator::parameters::{ParameterTable, PkParameters};
pub use crate::simulator::response::{respond, Release};
pub use crate::simulator::steady_state::{steady_state, SteadyState};
pub use crate::simulator::superposition::{multidose, TimeMode};
pub use crate::simulator::{predict, Regimen};
pub use error::{EstrannaiseError, Result};

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            history::Calibration,
            parser::{read_doses, write_doses},
            BloodTest, DosageRecord, DoseEvent, DoseHistory, DoseSeries, Formulation, InjectableDose,
            InjectableEster,
        };
    }
    pub mod simulator {
        pub use crate::simulator::{
            calibration::{fudge_factor, FudgeSeries},
            curve::{steady_state_curve, time_grid, Curve, CurveOptions, MAX_GRID_SAMPLES},
            parameters::{ParameterTable, PkParameters},
            predict, predict_with,
            response::{respond, Release},
            steady_state::{steady_state, SteadyState},
            superposition::{multidose, multidose_tags, multidose_with, TimeMode},
            Regimen,
        };
    }
    pub mod units {
        pub use crate::units::{
            convert, convert_estradiol, convert_hormone, convert_progesterone,
            convert_testosterone, ConcentrationUnit, Hormone,
        };
    }

    //extension traits
    pub use crate::data::builder::DoseSeriesBuilderExt;
    pub use crate::data::*;
    pub use crate::simulator::{predict, Regimen};
    pub use crate::EstrannaiseError;
}
