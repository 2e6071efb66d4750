use std::sync::{
    mpsc::{self, Sender},
    Mutex,
};
use std::thread;

use anyhow::{anyhow, Context, Result};
use log::info;
use rodio::{OutputStream, Sink};

use super::{tone::ChimeSound, Chime};
use crate::{cycle::Phase, settings::ChimeTone};

enum ChimeCommand {
    Play(Phase),
    SetVolume(f32),
}

/// Handle to the audio thread. `OutputStream` is not `Send`, so the stream
/// and sink live on a dedicated thread fed through a channel.
pub struct ChimeEngineHandle {
    tx: Mutex<Sender<ChimeCommand>>,
}

impl ChimeEngineHandle {
    /// Opens the default output device on the audio thread and waits for it.
    /// A missing or busy device is reported here, not on the first chime.
    pub fn spawn(tone: ChimeTone, volume: f32) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<ChimeCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        thread::Builder::new()
            .name("chime-engine".to_string())
            .spawn(move || {
                let opened = OutputStream::try_default()
                    .context("failed to create audio output stream")
                    .and_then(|(stream, handle)| {
                        Sink::try_new(&handle)
                            .context("failed to create audio sink")
                            .map(|sink| (stream, sink))
                    });
                let (_stream, sink) = match opened {
                    Ok(opened) => {
                        let _ = ready_tx.send(Ok(()));
                        opened
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                sink.set_volume(volume.clamp(0.0, 1.0));
                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        ChimeCommand::Play(ended) => sink.append(ChimeSound::for_phase(ended, tone)),
                        ChimeCommand::SetVolume(v) => sink.set_volume(v.clamp(0.0, 1.0)),
                    }
                }
                info!("Chime thread shutting down");
            })
            .context("failed to spawn chime thread")?;

        ready_rx
            .recv()
            .context("chime thread exited before signaling readiness")??;

        Ok(Self { tx: Mutex::new(tx) })
    }

    fn send(&self, command: ChimeCommand) -> Result<()> {
        self.tx
            .lock()
            .map_err(|_| anyhow!("chime engine lock poisoned"))?
            .send(command)
            .map_err(|e| anyhow!("chime thread gone: {e}"))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(ChimeCommand::SetVolume(volume))
    }
}

impl Chime for ChimeEngineHandle {
    fn play(&self, ended: Phase) -> Result<()> {
        self.send(ChimeCommand::Play(ended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_failure_surfaces_at_spawn() {
        // Either the device opens and chimes are accepted, or spawning fails
        // up front with the device error.
        match ChimeEngineHandle::spawn(ChimeTone::Bell, 0.0) {
            Ok(engine) => {
                assert!(engine.set_volume(0.0).is_ok());
                assert!(engine.play(Phase::Focus).is_ok());
            }
            Err(err) => assert!(format!("{err:#}").contains("audio")),
        }
    }
}
