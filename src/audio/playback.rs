//! Hosts the device pull loop on a dedicated OS thread.
//!
//! Uses std::thread (NOT tokio tasks) for real-time audio I/O so the pull
//! path never waits behind async work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::container::PcmStream;
use super::feeder::{CursorObserver, Feeder, FeederState};
use super::format::PcmFormat;
use super::output::AudioOutputDevice;
use crate::error::Error;
use crate::Result;

/// What the playback thread did before it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Frames handed to the device
    pub frames: u64,
    /// True if the stream ran to its end, false if stopped early
    pub completed: bool,
}

/// Negotiate with `device`, falling back to 48 kHz stereo float when the
/// requested layout is refused outright.
pub fn negotiate(device: &mut dyn AudioOutputDevice, requested: &PcmFormat) -> Result<PcmFormat> {
    match device.negotiate_format(requested) {
        Ok(accepted) => Ok(accepted),
        Err(e) => {
            let fallback = PcmFormat::float32(48000, 2);
            log::warn!(
                "Device '{}' rejected {} ({}), retrying with {}",
                device.name(),
                requested,
                e,
                fallback
            );
            device.negotiate_format(&fallback)
        }
    }
}

/// Negotiate a format for `stream` and build the feeder that renders into it.
pub fn prepare(
    stream: PcmStream,
    device: &mut dyn AudioOutputDevice,
    requested: &PcmFormat,
) -> Result<Feeder> {
    let accepted = negotiate(device, requested)?;
    stream.into_feeder(accepted, device.max_frames())
}

/// A running playback: one feeder pulled by one device on the `audio-play` thread.
pub struct Playback {
    running: Arc<AtomicBool>,
    observer: CursorObserver,
    play_handle: Option<JoinHandle<Result<PlaybackReport>>>,
}

impl Playback {
    /// Start pulling `feeder` through `device`.
    pub fn start(feeder: Feeder, device: Box<dyn AudioOutputDevice>) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let observer = feeder.observer();

        log::info!(
            "Playback starting: device=\"{}\", {} -> {}",
            device.name(),
            feeder.descriptor().format(),
            feeder.destination(),
        );

        let play_handle = {
            let running = running.clone();
            thread::Builder::new()
                .name("audio-play".into())
                .spawn(move || {
                    let result = play_thread(feeder, device, &running);
                    if let Err(e) = &result {
                        log::error!("Playback thread error: {}", e);
                    }
                    result
                })?
        };

        Ok(Self {
            running,
            observer,
            play_handle: Some(play_handle),
        })
    }

    /// Cursor view for progress and completion polling.
    pub fn observer(&self) -> &CursorObserver {
        &self.observer
    }

    /// The playback thread has exited (drained, stopped, or failed).
    pub fn is_finished(&self) -> bool {
        self.play_handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Ask the device loop to stop after the current period.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Block until the playback thread exits.
    pub fn wait(mut self) -> Result<PlaybackReport> {
        self.join()
    }

    fn join(&mut self) -> Result<PlaybackReport> {
        match self.play_handle.take() {
            Some(h) => h
                .join()
                .map_err(|_| Error::Output("playback thread panicked".into()))?,
            None => Err(Error::Output("playback already joined".into())),
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        if self.play_handle.is_some() {
            self.stop();
            let _ = self.join();
        }
    }
}

fn play_thread(
    mut feeder: Feeder,
    mut device: Box<dyn AudioOutputDevice>,
    running: &AtomicBool,
) -> Result<PlaybackReport> {
    let frames = device.play(&mut feeder, running)?;

    let completed = feeder.state() == FeederState::Drained;
    if completed {
        device.signal_stream_end()?;
        log::info!("Playback finished: {} frames", frames);
    } else {
        log::info!("Playback stopped early after {} frames", frames);
    }

    Ok(PlaybackReport { frames, completed })
}
