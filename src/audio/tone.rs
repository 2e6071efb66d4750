use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

use crate::{cycle::Phase, settings::ChimeTone};

const SAMPLE_RATE: u32 = 44100;

/// Short decaying sine, mono.
pub struct ChimeSound {
    freq: f32,
    decay: f32,
    sample_rate: u32,
    num_sample: usize,
    total_samples: usize,
}

impl ChimeSound {
    pub fn new(freq: f32, decay: f32, duration: Duration) -> Self {
        Self {
            freq,
            decay,
            sample_rate: SAMPLE_RATE,
            num_sample: 0,
            total_samples: (duration.as_secs_f32() * SAMPLE_RATE as f32) as usize,
        }
    }

    /// Focus ending rings higher than a break ending.
    pub fn for_phase(ended: Phase, tone: ChimeTone) -> Self {
        let freq = match ended {
            Phase::Focus => 880.0,
            Phase::ShortBreak | Phase::LongBreak => 660.0,
        };
        match tone {
            ChimeTone::Bell => Self::new(freq, 4.0, Duration::from_millis(900)),
            ChimeTone::Soft => Self::new(freq / 2.0, 2.5, Duration::from_millis(1400)),
        }
    }
}

impl Iterator for ChimeSound {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        let t = self.num_sample as f32 / self.sample_rate as f32;
        self.num_sample += 1;

        let envelope = (-self.decay * t).exp();
        Some((2.0 * PI * self.freq * t).sin() * envelope * 0.4)
    }
}

impl Source for ChimeSound {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples.saturating_sub(self.num_sample))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / self.sample_rate as f32,
        ))
    }
}
