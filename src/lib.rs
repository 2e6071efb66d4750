//! Pomodoro-style focus/break cycle timer.
//!
//! [`cycle::CycleMachine`] is the pure state machine; [`cycle::CycleController`]
//! drives it once per second and performs its effects (chime, persistence,
//! history). Configuration and the completed-cycle counter survive restarts
//! through any [`store::KeyValueStore`].

pub mod audio;
pub mod cli;
pub mod cycle;
pub mod db;
pub mod settings;
pub mod store;
mod utils;
