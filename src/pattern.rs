//! Ordered notes played to one device, once or in a loop.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::note::Note;
use mass_midi::Expression;
use mass_midi_io::{DeviceHandle, DeviceRegistry};
use std::time::Duration;
use tracing::{debug, info};

/// A named, ordered list of notes bound to an output device.
///
/// Notes are appended while the pattern is being defined; playback never
/// changes it. A repeating pattern loops until its cancellation token fires.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    name: String,
    device: String,
    channel: u8,
    bars: u32,
    tempo: f64,
    repeat: bool,
    notes: Vec<Note>,
}

impl Pattern {
    pub const DEFAULT_BARS: u32 = 4;

    pub fn new(name: impl Into<String>, device: impl Into<String>, tempo: f64) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            channel: 0,
            bars: Self::DEFAULT_BARS,
            tempo,
            repeat: false,
            notes: Vec::new(),
        }
    }

    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// MIDI channel 0-15; higher values are clamped on the wire.
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Informational, playback does not use it.
    pub fn with_bars(mut self, bars: u32) -> Self {
        self.bars = bars;
        self
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Append a pitched note at this pattern's tempo and the default expression.
    pub fn note(&mut self, rhythmic_value: u32, pitch: &str) -> Result<&mut Self> {
        self.note_with(rhythmic_value, pitch, Expression::default())
    }

    pub fn note_with(
        &mut self,
        rhythmic_value: u32,
        pitch: &str,
        expression: impl Into<Expression>,
    ) -> Result<&mut Self> {
        let note = Note::new(rhythmic_value, Some(pitch), expression.into(), self.tempo)?;
        self.notes.push(note);
        Ok(self)
    }

    pub fn rest(&mut self, rhythmic_value: u32) -> Result<&mut Self> {
        let note = Note::rest(rhythmic_value, self.tempo)?;
        self.notes.push(note);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn bars(&self) -> u32 {
        self.bars
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn repeats(&self) -> bool {
        self.repeat
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Length of one pass through the notes, saturating at `Duration::MAX`.
    pub fn duration(&self) -> Duration {
        self.notes
            .iter()
            .fold(Duration::ZERO, |total, note| total.saturating_add(note.duration()))
    }

    /// Open the device, play, then close the device.
    ///
    /// A non-repeating pattern plays its notes once. A repeating pattern
    /// plays passes until `cancel` fires. Cancellation cuts the hold of the
    /// note in flight short, sends its note-off and starts no further note.
    /// The device is closed on every exit path, including errors.
    pub fn play(&self, devices: &DeviceRegistry, cancel: &CancellationToken) -> Result<()> {
        let out = devices.open(&self.device)?;
        info!(
            "Pattern '{}' playing on '{}' ({} notes, repeat: {})",
            self.name,
            self.device,
            self.notes.len(),
            self.repeat
        );

        let result = if self.repeat {
            self.play_loop(&out, cancel)
        } else {
            self.play_pass(&out, cancel).map(|_| ())
        };

        out.close();
        debug!("Pattern '{}' closed '{}'", self.name, self.device);
        result
    }

    /// Play a single pass regardless of the repeat flag.
    pub fn play_once(&self, devices: &DeviceRegistry, cancel: &CancellationToken) -> Result<()> {
        let out = devices.open(&self.device)?;
        let result = self.play_pass(&out, cancel).map(|_| ());
        out.close();
        result
    }

    fn play_loop(&self, out: &DeviceHandle, cancel: &CancellationToken) -> Result<()> {
        // Nothing to loop over: idle until stopped instead of spinning.
        if self.notes.is_empty() {
            cancel.wait();
            return Ok(());
        }

        let mut passes = 0u64;
        while !cancel.is_cancelled() {
            if !self.play_pass(out, cancel)? {
                break;
            }
            passes += 1;
        }
        debug!("Pattern '{}' stopped after {} passes", self.name, passes);
        Ok(())
    }

    /// Returns `false` if cancelled before the last note.
    fn play_pass(&self, out: &DeviceHandle, cancel: &CancellationToken) -> Result<bool> {
        for note in &self.notes {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            note.play(out, self.channel, cancel)?;
        }
        Ok(true)
    }
}
