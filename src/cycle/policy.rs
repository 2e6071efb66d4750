use super::{config::PhaseConfig, state::Phase};

/// Decides which phase follows `current` and how long it lasts.
///
/// `completed_cycles` is the number of Focus phases finished *before* the one
/// that is ending now. With `cycles_before_long_break == 1` every Focus is
/// followed by a long break.
pub fn next_phase(current: Phase, completed_cycles: u32, config: &PhaseConfig) -> (Phase, u32) {
    match current {
        Phase::Focus => {
            let every = config.cycles_before_long_break.max(1);
            let finished = u64::from(completed_cycles) + 1;
            if finished % u64::from(every) == 0 {
                (Phase::LongBreak, config.long_break_duration_seconds)
            } else {
                (Phase::ShortBreak, config.short_break_duration_seconds)
            }
        }
        Phase::ShortBreak | Phase::LongBreak => (Phase::Focus, config.focus_duration_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cycles: u32) -> PhaseConfig {
        PhaseConfig {
            focus_duration_seconds: 1500,
            short_break_duration_seconds: 300,
            long_break_duration_seconds: 900,
            cycles_before_long_break: cycles,
        }
    }

    #[test]
    fn test_breaks_return_to_focus() {
        let config = config(4);
        assert_eq!(next_phase(Phase::ShortBreak, 2, &config), (Phase::Focus, 1500));
        assert_eq!(next_phase(Phase::LongBreak, 4, &config), (Phase::Focus, 1500));
    }

    #[test]
    fn test_every_nth_focus_earns_long_break() {
        for every in 1..=6u32 {
            let config = config(every);
            for completed in 0..30u32 {
                let (phase, duration) = next_phase(Phase::Focus, completed, &config);
                if (completed + 1) % every == 0 {
                    assert_eq!((phase, duration), (Phase::LongBreak, 900), "n={every} k={completed}");
                } else {
                    assert_eq!((phase, duration), (Phase::ShortBreak, 300), "n={every} k={completed}");
                }
            }
        }
    }

    #[test]
    fn test_single_cycle_always_long_break() {
        let config = config(1);
        assert_eq!(next_phase(Phase::Focus, 0, &config).0, Phase::LongBreak);
        assert_eq!(next_phase(Phase::Focus, 7, &config).0, Phase::LongBreak);
    }

    #[test]
    fn test_counter_at_u32_max_does_not_overflow() {
        let config = config(2);
        let (phase, _) = next_phase(Phase::Focus, u32::MAX, &config);
        // u32::MAX + 1 = 2^32 is even
        assert_eq!(phase, Phase::LongBreak);
    }
}
