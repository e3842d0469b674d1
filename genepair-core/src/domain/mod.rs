//! Domain types: parameters, joint states, steady states and dataset rows.

pub mod params;
pub mod record;
pub mod state;

pub use params::{ModelVariant, ParamName, ParameterVector};
pub use record::{header, SampleRecord, PROBABILITY_COLUMNS};
pub use state::{JointState, SteadyState};
