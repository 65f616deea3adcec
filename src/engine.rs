//! MassEngine: device registry plus session-wide cancellation.

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::playable::Playable;
use crate::sequence::{SequenceOptions, SequenceReport};
use mass_midi_io::DeviceRegistry;
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Plays notes, patterns and sequences to the devices of one backend.
///
/// # Example
///
/// ```
/// use mass::prelude::*;
///
/// let backend = RecordingBackend::new();
/// let engine = MassEngine::builder().backend(backend.clone()).build()?;
///
/// let mut riff = Pattern::new("riff", "synth", 1.0);
/// riff.note(8, "G4")?.note(8, "E4")?;
/// engine.play(&riff.into())?;
///
/// assert_eq!(backend.log("synth").messages().len(), 4);
/// # Ok::<(), mass::Error>(())
/// ```
pub struct MassEngine {
    devices: DeviceRegistry,
    session: Mutex<CancellationToken>,
    options: SequenceOptions,
}

impl MassEngine {
    pub fn builder() -> crate::MassEngineBuilder {
        crate::MassEngineBuilder::default()
    }

    pub(crate) fn from_parts(devices: DeviceRegistry, options: SequenceOptions) -> Self {
        Self {
            devices,
            session: Mutex::new(CancellationToken::new()),
            options,
        }
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Output names the backend can open.
    pub fn list_devices(&self) -> Vec<String> {
        self.devices.list_devices()
    }

    pub fn sequence_options(&self) -> SequenceOptions {
        self.options
    }

    /// A token cancelled by the next [`MassEngine::stop_all`].
    pub fn session_token(&self) -> CancellationToken {
        self.session.lock().child_token()
    }

    /// Stop everything currently playing. Later playback is unaffected.
    pub fn stop_all(&self) {
        let session = std::mem::take(&mut *self.session.lock());
        session.cancel();
        info!("Stopped all playback");
    }

    /// Play on the calling thread until done or stopped.
    pub fn play(&self, playable: &Playable) -> Result<()> {
        let cancel = self.session_token();
        play_with(&self.devices, playable, &cancel, self.options)
    }

    /// Play a sequence and report how each of its patterns ended.
    pub fn play_report(&self, sequence: &crate::Sequence) -> SequenceReport {
        sequence.play_with(&self.devices, &self.session_token(), self.options)
    }

    /// Play on a background thread.
    pub fn spawn(&self, playable: impl Into<Playable>) -> Result<PlaybackHandle> {
        let playable = playable.into();
        let name = playable.name().to_string();
        let cancel = self.session_token();

        let devices = self.devices.clone();
        let options = self.options;
        let thread_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name(format!("mass-{}", name))
            .spawn(move || play_with(&devices, &playable, &thread_cancel, options))?;

        debug!("Spawned playback of '{}'", name);
        Ok(PlaybackHandle {
            name,
            cancel,
            thread: Some(thread),
        })
    }
}

fn play_with(
    devices: &DeviceRegistry,
    playable: &Playable,
    cancel: &CancellationToken,
    options: SequenceOptions,
) -> Result<()> {
    match playable {
        Playable::Sequence(sequence) => sequence.play_with(devices, cancel, options).into_result(),
        other => other.play(devices, cancel),
    }
}

/// Background playback started by [`MassEngine::spawn`].
///
/// Dropping the handle stops playback and waits for the thread.
pub struct PlaybackHandle {
    name: String,
    cancel: CancellationToken,
    thread: Option<JoinHandle<Result<()>>>,
}

impl PlaybackHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        match &self.thread {
            Some(thread) => thread.is_finished(),
            None => true,
        }
    }

    /// Block until playback ends and return its result.
    pub fn wait(mut self) -> Result<()> {
        self.join()
    }

    /// Stop and wait.
    pub fn stop_and_wait(self) -> Result<()> {
        self.stop();
        self.wait()
    }

    fn join(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .unwrap_or_else(|_| Err(Error::Panicked(self.name.clone()))),
            None => Ok(()),
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
            let _ = self.join();
        }
    }
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
