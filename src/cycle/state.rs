use serde::{Deserialize, Serialize};

use super::config::PhaseConfig;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::ShortBreak => "ShortBreak",
            Phase::LongBreak => "LongBreak",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::ShortBreak => "short break",
            Phase::LongBreak => "long break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Focus)
    }

    /// Configured length of this phase in seconds.
    pub fn duration_in(&self, config: &PhaseConfig) -> u32 {
        match self {
            Phase::Focus => config.focus_duration_seconds,
            Phase::ShortBreak => config.short_break_duration_seconds,
            Phase::LongBreak => config.long_break_duration_seconds,
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Focus" => Ok(Phase::Focus),
            "ShortBreak" => Ok(Phase::ShortBreak),
            "LongBreak" => Ok(Phase::LongBreak),
            other => Err(anyhow::anyhow!("unknown phase '{other}'")),
        }
    }
}

/// Derived from the `is_running`/`is_paused` flags; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub current_phase: Phase,
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub is_paused: bool,
}

impl TimerState {
    /// Fresh session state: Focus, full focus duration, not running.
    pub fn new(config: &PhaseConfig) -> Self {
        Self {
            current_phase: Phase::Focus,
            remaining_seconds: config.focus_duration_seconds,
            is_running: false,
            is_paused: false,
        }
    }

    pub fn status(&self) -> TimerStatus {
        match (self.is_running, self.is_paused) {
            (false, _) => TimerStatus::Idle,
            (true, true) => TimerStatus::Paused,
            (true, false) => TimerStatus::Running,
        }
    }

    /// True while ticks are allowed to advance the countdown.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused
    }

    pub fn enter_phase(&mut self, phase: Phase, duration_seconds: u32) {
        self.current_phase = phase;
        self.remaining_seconds = duration_seconds;
    }

    /// Back to `(Focus, Idle)` with a full focus countdown.
    pub fn reset(&mut self, config: &PhaseConfig) {
        *self = Self {
            current_phase: Phase::Focus,
            remaining_seconds: config.focus_duration_seconds,
            is_running: false,
            is_paused: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_is_focus() {
        assert_eq!(Phase::default(), Phase::Focus);
    }

    #[test]
    fn test_status_is_derived_from_flags() {
        let config = PhaseConfig::default();
        let mut state = TimerState::new(&config);
        assert_eq!(state.status(), TimerStatus::Idle);

        state.is_running = true;
        assert_eq!(state.status(), TimerStatus::Running);
        assert!(state.is_ticking());

        state.is_paused = true;
        assert_eq!(state.status(), TimerStatus::Paused);
        assert!(!state.is_ticking());
    }

    #[test]
    fn test_reset_state_is_idle_focus() {
        let config = PhaseConfig::default();
        let mut state = TimerState::new(&config);
        state.is_running = true;
        state.enter_phase(Phase::ShortBreak, 42);

        state.reset(&config);

        assert_eq!(state.current_phase, Phase::Focus);
        assert_eq!(state.remaining_seconds, config.focus_duration_seconds);
        assert_eq!(state.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_phase_round_trips_through_str() {
        for phase in [Phase::Focus, Phase::ShortBreak, Phase::LongBreak] {
            assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }
        assert!("Nap".parse::<Phase>().is_err());
    }
}
