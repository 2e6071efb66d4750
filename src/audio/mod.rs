//! Audible cue played when a phase runs out.
//!
//! Playback is best effort: callers log a failed [`Chime::play`] and move on.

#[cfg(feature = "audio")]
mod engine;
#[cfg(feature = "audio")]
mod tone;

use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::{Context, Result};

use crate::{
    cycle::Phase,
    settings::ChimeSettings,
};

#[cfg(feature = "audio")]
pub use engine::ChimeEngineHandle;

pub trait Chime: Send + Sync {
    fn play(&self, ended: Phase) -> Result<()>;
}

pub struct SilentChime;

impl Chime for SilentChime {
    fn play(&self, _ended: Phase) -> Result<()> {
        Ok(())
    }
}

/// Terminal bell on stderr. Two rings when a break ends so the return to
/// focus is distinguishable without looking.
pub struct BellChime;

impl Chime for BellChime {
    fn play(&self, ended: Phase) -> Result<()> {
        let rings = if ended.is_break() { "\x07\x07" } else { "\x07" };
        let mut stderr = io::stderr().lock();
        stderr
            .write_all(rings.as_bytes())
            .and_then(|_| stderr.flush())
            .context("failed to ring terminal bell")
    }
}

/// Picks the chime for the current settings. Falls back to the terminal bell
/// when the audio device cannot be used.
pub fn chime_from_settings(settings: &ChimeSettings) -> Arc<dyn Chime> {
    if !settings.enabled || settings.volume <= 0.0 {
        return Arc::new(SilentChime);
    }

    #[cfg(feature = "audio")]
    {
        match ChimeEngineHandle::spawn(settings.tone, settings.volume) {
            Ok(engine) => return Arc::new(engine),
            Err(err) => log::warn!("Audio chime unavailable, using terminal bell: {err:#}"),
        }
    }

    Arc::new(BellChime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_settings_yield_silence() {
        let settings = ChimeSettings {
            enabled: false,
            ..ChimeSettings::default()
        };
        let chime = chime_from_settings(&settings);
        assert!(chime.play(Phase::Focus).is_ok());
    }

    #[test]
    fn test_zero_volume_is_silent() {
        let settings = ChimeSettings {
            volume: 0.0,
            ..ChimeSettings::default()
        };
        assert!(chime_from_settings(&settings).play(Phase::LongBreak).is_ok());
    }
}
