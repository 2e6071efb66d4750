pub mod phase_record;

pub use phase_record::{FocusSummary, PhaseRecord};
