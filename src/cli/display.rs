//! Terminal rendering for the `run` loop and the one-shot commands.
//!
//! The live countdown goes to stderr so stdout stays clean for `status`
//! and `history` output.

use colored::{ColoredString, Colorize};

use crate::{
    cycle::{Phase, PhaseCompletion, PhaseConfig, TimerSnapshot, TimerStatus},
    db::{FocusSummary, PhaseRecord},
    settings::ChimeSettings,
};

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn phase_badge(phase: Phase) -> ColoredString {
    match phase {
        Phase::Focus => " FOCUS ".bold().black().on_red(),
        Phase::ShortBreak => " SHORT BREAK ".bold().black().on_green(),
        Phase::LongBreak => " LONG BREAK ".bold().black().on_cyan(),
    }
}

pub struct CycleDisplay;

impl CycleDisplay {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, snapshot: &TimerSnapshot) {
        eprintln!("\n{}", "=== focuscycle ===".bold().cyan());
        eprintln!(
            "  {} focus {} / short {} / long {} every {} cycles",
            "Config:".dimmed(),
            format_clock(snapshot.config.focus_duration_seconds),
            format_clock(snapshot.config.short_break_duration_seconds),
            format_clock(snapshot.config.long_break_duration_seconds),
            snapshot.config.cycles_before_long_break
        );
        eprintln!(
            "  {} [s]tart/resume  [p]ause  [r]eset  [q]uit",
            "Keys:".dimmed()
        );
        eprintln!("{}", "─".repeat(50).dimmed());
    }

    pub fn render_tick(&self, snapshot: &TimerSnapshot) {
        let status = match snapshot.status {
            TimerStatus::Running => "running".green(),
            TimerStatus::Paused => "paused".yellow(),
            TimerStatus::Idle => "idle".dimmed(),
        };
        eprint!(
            "\r{} {}  {}  cycles: {}   ",
            phase_badge(snapshot.state.current_phase),
            format_clock(snapshot.state.remaining_seconds).as_str().bold(),
            status,
            snapshot.completed_cycles
        );
    }

    pub fn render_completion(&self, completion: &PhaseCompletion) {
        eprintln!(
            "\n{} {} done, next: {} ({})",
            "✔".green().bold(),
            completion.ended.label(),
            completion.next.label().bold(),
            format_clock(completion.next_duration_seconds)
        );
    }

    pub fn render_stopped(&self, snapshot: &TimerSnapshot) {
        eprintln!(
            "\n{} stopped in {} with {} left, {} cycles completed",
            "■".yellow(),
            snapshot.state.current_phase.label(),
            format_clock(snapshot.state.remaining_seconds),
            snapshot.completed_cycles
        );
    }
}

impl Default for CycleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_config(config: &PhaseConfig) {
    println!(
        "focus:               {}s ({})",
        config.focus_duration_seconds,
        format_clock(config.focus_duration_seconds)
    );
    println!(
        "short break:         {}s ({})",
        config.short_break_duration_seconds,
        format_clock(config.short_break_duration_seconds)
    );
    println!(
        "long break:          {}s ({})",
        config.long_break_duration_seconds,
        format_clock(config.long_break_duration_seconds)
    );
    println!("cycles before long:  {}", config.cycles_before_long_break);
}

pub fn print_status(config: &PhaseConfig, completed_cycles: u32, today: &FocusSummary) {
    print_config(config);
    let every = config.cycles_before_long_break.max(1);
    let until_long = every - completed_cycles % every;
    println!("completed cycles:    {completed_cycles} ({until_long} until long break)");
    println!(
        "focused today:       {} phases, {} min",
        today.focus_phases,
        today.focused_seconds / 60
    );
}

pub fn print_history(records: &[PhaseRecord]) {
    if records.is_empty() {
        println!("{}", "no finished phases yet".dimmed());
        return;
    }
    for record in records {
        println!(
            "{}  {:<11} {}  cycles: {}",
            record.completed_at.format("%Y-%m-%d %H:%M"),
            record.phase.label(),
            format_clock(record.planned_seconds),
            record.completed_cycles
        );
    }
}

pub fn print_chime(settings: &ChimeSettings) {
    println!(
        "chime: {} volume {:.2} tone {:?}",
        if settings.enabled { "on".green() } else { "off".red() },
        settings.volume,
        settings.tone
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(3725), "62:05");
    }
}
