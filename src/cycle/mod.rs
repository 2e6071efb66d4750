pub mod config;
pub mod controller;
pub mod machine;
pub mod policy;
pub mod state;

pub use config::{ConfigError, PhaseConfig, PhaseConfigUpdate};
pub use controller::{CycleController, CycleEvent, TimerSnapshot};
pub use machine::{CycleMachine, Effect, PhaseCompletion};
pub use policy::next_phase;
pub use state::{Phase, TimerState, TimerStatus};
