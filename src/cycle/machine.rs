//! Pure focus/break state machine.
//!
//! Every operation mutates in-memory state only and returns the side effects
//! the caller has to perform (chime, persistence, history). Nothing here
//! touches the clock, audio or storage, so the whole cycle can be driven tick
//! by tick in tests.

use serde::Serialize;

use super::{
    config::{ConfigError, PhaseConfig, PhaseConfigUpdate},
    policy::next_phase,
    state::{Phase, TimerState},
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCompletion {
    pub ended: Phase,
    pub planned_seconds: u32,
    pub next: Phase,
    pub next_duration_seconds: u32,
    pub completed_cycles: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Audible cue for a phase that ran out.
    Chime { ended: Phase },
    PhaseCompleted(PhaseCompletion),
    SaveConfig(PhaseConfig),
    SaveCompletedCycles(u32),
}

#[derive(Debug, Clone)]
pub struct CycleMachine {
    config: PhaseConfig,
    state: TimerState,
    completed_cycles: u32,
    /// Bumped whenever start/pause/reset changes whether ticks may apply.
    generation: u64,
}

impl CycleMachine {
    pub fn new(config: PhaseConfig, completed_cycles: u32) -> Self {
        Self {
            state: TimerState::new(&config),
            config,
            completed_cycles,
            generation: 0,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts or resumes the countdown. Returns `false` if it was already
    /// ticking.
    pub fn start(&mut self) -> bool {
        if self.state.is_ticking() {
            return false;
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    /// Returns `false` if already paused.
    pub fn pause(&mut self) -> bool {
        if self.state.is_paused {
            return false;
        }
        self.state.is_paused = true;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    pub fn reset(&mut self) -> Vec<Effect> {
        self.state.reset(&self.config);
        self.completed_cycles = 0;
        self.generation = self.generation.wrapping_add(1);
        vec![Effect::SaveCompletedCycles(0)]
    }

    /// One second of wall-clock time. Does nothing unless ticking.
    pub fn tick(&mut self) -> Vec<Effect> {
        if !self.state.is_ticking() {
            return Vec::new();
        }

        if self.state.remaining_seconds > 1 {
            self.state.remaining_seconds -= 1;
            return Vec::new();
        }

        self.advance()
    }

    /// Applies a tick only if it was scheduled under the current generation.
    /// `None` means the tick is stale and the ticker should stop.
    pub fn tick_for(&mut self, generation: u64) -> Option<Vec<Effect>> {
        if generation != self.generation || !self.state.is_ticking() {
            return None;
        }
        Some(self.tick())
    }

    /// Validates and applies `update`. While ticking, the running phase keeps
    /// its remaining time; otherwise the countdown is recomputed for the
    /// current phase. The completed-cycle counter is left alone.
    pub fn configure(&mut self, update: &PhaseConfigUpdate) -> Result<Vec<Effect>, ConfigError> {
        let config = self.config.merged(update)?;
        self.config = config;

        if !self.state.is_ticking() {
            self.state.remaining_seconds = self.state.current_phase.duration_in(&self.config);
        }

        Ok(vec![Effect::SaveConfig(config)])
    }

    /// Only reached when the countdown runs out; reset is the sole other way
    /// out of a phase.
    fn advance(&mut self) -> Vec<Effect> {
        let ended = self.state.current_phase;
        let planned_seconds = ended.duration_in(&self.config);
        let (next, next_duration_seconds) = next_phase(ended, self.completed_cycles, &self.config);

        self.state.enter_phase(next, next_duration_seconds);

        let mut effects = vec![Effect::Chime { ended }];
        if ended == Phase::Focus {
            self.completed_cycles = self.completed_cycles.saturating_add(1);
            effects.push(Effect::SaveCompletedCycles(self.completed_cycles));
        }
        effects.push(Effect::PhaseCompleted(PhaseCompletion {
            ended,
            planned_seconds,
            next,
            next_duration_seconds,
            completed_cycles: self.completed_cycles,
        }));
        effects
    }
}
