//! A single timed event: a pitch held for a rhythmic value, or a rest.

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use mass_midi::{Expression, Pitch};
use mass_midi_io::DeviceHandle;
use std::time::Duration;
use tracing::{trace, warn};

/// Seconds per unit of `tempo / rhythmic_value`.
const DURATION_SCALE: f64 = 0.01;

/// A note or rest, with its timing fixed at construction.
///
/// The hold time is `(tempo / rhythmic_value) * 0.01` seconds, so at the
/// default 100 BPM a quarter (`4`) lasts 0.25 s and an eighth (`8`) 0.125 s.
///
/// ```
/// use mass::Note;
/// use mass::midi::Dynamic;
///
/// let note = Note::new(4, Some("C4"), Dynamic::Ff.into(), 100.0)?;
/// assert_eq!(note.midi(), Some(84));
/// assert_eq!(note.velocity(), 127);
/// assert_eq!(note.duration().as_millis(), 250);
/// # Ok::<(), mass::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    rhythmic_value: u32,
    pitch: Option<Pitch>,
    expression: Expression,
    tempo: f64,
    duration: Duration,
}

impl Note {
    /// Build a note. `pitch = None` makes a rest.
    ///
    /// Fails with `InvalidNote` for a zero rhythmic value or a tempo that is
    /// not a positive finite number, and with a pitch error for an
    /// unresolvable pitch.
    pub fn new(
        rhythmic_value: u32,
        pitch: Option<&str>,
        expression: Expression,
        tempo: f64,
    ) -> Result<Note> {
        if rhythmic_value == 0 {
            return Err(Error::InvalidNote(
                "rhythmic value must be positive".to_string(),
            ));
        }
        if !tempo.is_finite() || tempo <= 0.0 {
            return Err(Error::InvalidNote(format!(
                "tempo must be a positive number, got {}",
                tempo
            )));
        }

        let secs = (tempo / rhythmic_value as f64) * DURATION_SCALE;
        let duration = Duration::try_from_secs_f64(secs).map_err(|_| {
            Error::InvalidNote(format!("tempo {} gives an unplayable duration", tempo))
        })?;

        let pitch = pitch.map(Pitch::resolve).transpose()?;

        Ok(Note {
            rhythmic_value,
            pitch,
            expression,
            tempo,
            duration,
        })
    }

    /// A pitched note at the default expression.
    pub fn pitched(rhythmic_value: u32, pitch: &str, tempo: f64) -> Result<Note> {
        Self::new(rhythmic_value, Some(pitch), Expression::default(), tempo)
    }

    pub fn rest(rhythmic_value: u32, tempo: f64) -> Result<Note> {
        Self::new(rhythmic_value, None, Expression::default(), tempo)
    }

    pub fn rhythmic_value(&self) -> u32 {
        self.rhythmic_value
    }

    pub fn pitch(&self) -> Option<&Pitch> {
        self.pitch.as_ref()
    }

    pub fn expression(&self) -> Expression {
        self.expression
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    pub fn midi(&self) -> Option<u8> {
        self.pitch.as_ref().map(Pitch::midi)
    }

    pub fn velocity(&self) -> u8 {
        self.expression.velocity()
    }

    pub fn duration_secs(&self) -> f64 {
        (self.tempo / self.rhythmic_value as f64) * DURATION_SCALE
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sound the note on `device`, blocking for its duration.
    ///
    /// A pitched note writes note-on, holds, then writes note-off with the
    /// same pitch and velocity. A rest only holds. Cancellation cuts the hold
    /// short but the note-off is still written.
    pub fn play(&self, device: &DeviceHandle, channel: u8, cancel: &CancellationToken) -> Result<()> {
        let duration = self.duration();

        let Some(pitch) = &self.pitch else {
            cancel.sleep(duration);
            return Ok(());
        };

        let (midi, velocity) = (pitch.midi(), self.velocity());
        device.note_on(channel, midi, velocity)?;
        trace!("{} on '{}' for {:?}", pitch, device.name(), duration);

        if cancel.sleep(duration) {
            trace!("{} on '{}' cut short", pitch, device.name());
        }

        device.note_off(channel, midi, velocity).map_err(|e| {
            warn!("Note-off for {} on '{}' failed, note may hang: {}", pitch, device.name(), e);
            e
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mass_midi::{Dynamic, PitchError};
    use mass_midi_io::{DeviceRegistry, RecordingBackend};
    use std::time::Instant;

    #[test]
    fn test_duration_formula() {
        let quarter = Note::pitched(4, "C4", 100.0).unwrap();
        assert_relative_eq!(quarter.duration_secs(), 0.25);

        let eighth = Note::pitched(8, "G4", 125.0).unwrap();
        assert_relative_eq!(eighth.duration_secs(), 0.15625);

        let whole = Note::rest(1, 60.0).unwrap();
        assert_relative_eq!(whole.duration_secs(), 0.6);
    }

    #[test]
    fn test_velocity_from_expression() {
        let loud = Note::new(4, Some("C4"), Dynamic::Ff.into(), 100.0).unwrap();
        assert_eq!(loud.velocity(), 127);

        let default = Note::pitched(4, "C4", 100.0).unwrap();
        assert_eq!(default.velocity(), 97);

        let literal = Note::new(4, Some("C4"), Expression::Velocity(42), 100.0).unwrap();
        assert_eq!(literal.velocity(), 42);
    }

    #[test]
    fn test_rest_has_no_pitch() {
        let rest = Note::rest(2, 100.0).unwrap();
        assert!(rest.is_rest());
        assert_eq!(rest.midi(), None);
    }

    #[test]
    fn test_invalid_pitch_rejected() {
        let err = Note::pitched(4, "H4", 100.0).unwrap_err();
        assert!(matches!(err, Error::Pitch(PitchError::NotFound(ref p)) if p == "H4"));
    }

    #[test]
    fn test_zero_rhythmic_value_rejected() {
        assert!(matches!(
            Note::pitched(0, "C4", 100.0),
            Err(Error::InvalidNote(_))
        ));
    }

    #[test]
    fn test_bad_tempo_rejected() {
        for tempo in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(Note::rest(4, tempo), Err(Error::InvalidNote(_))));
        }
    }

    #[test]
    fn test_tempo_beyond_duration_range_rejected() {
        // 1e30 / 1 * 0.01 seconds does not fit a Duration.
        assert!(matches!(Note::rest(1, 1e30), Err(Error::InvalidNote(_))));
        assert!(matches!(
            Note::pitched(1, "C4", f64::MAX),
            Err(Error::InvalidNote(_))
        ));

        // Huge but representable.
        let long = Note::rest(1, 1e12).unwrap();
        assert_eq!(long.duration(), Duration::from_secs(10_000_000_000));
    }

    #[test]
    fn test_play_writes_on_then_off() {
        let backend = RecordingBackend::new();
        let devices = DeviceRegistry::new(backend.clone());
        let out = devices.open("synth").unwrap();

        let note = Note::new(4, Some("E4"), Dynamic::F.into(), 1.0).unwrap();
        note.play(&out, 0, &CancellationToken::new()).unwrap();

        assert_eq!(
            backend.log("synth").bytes(),
            vec![[0x90, 88, 107], [0x80, 88, 107]]
        );
    }

    #[test]
    fn test_play_uses_channel() {
        let backend = RecordingBackend::new();
        let devices = DeviceRegistry::new(backend.clone());
        let out = devices.open("synth").unwrap();

        Note::pitched(4, "C4", 1.0)
            .unwrap()
            .play(&out, 9, &CancellationToken::new())
            .unwrap();

        assert_eq!(
            backend.log("synth").bytes(),
            vec![[0x99, 84, 97], [0x89, 84, 97]]
        );
    }

    #[test]
    fn test_rest_writes_nothing_but_waits() {
        let backend = RecordingBackend::new();
        let devices = DeviceRegistry::new(backend.clone());
        let out = devices.open("synth").unwrap();

        // 100 / 1 * 0.01 = 1.0 s would be slow; 3 / 1 * 0.01 = 30 ms
        let rest = Note::rest(1, 3.0).unwrap();
        let start = Instant::now();
        rest.play(&out, 0, &CancellationToken::new()).unwrap();

        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(backend.log("synth").messages().is_empty());
    }

    #[test]
    fn test_cancelled_note_still_sends_off() {
        let backend = RecordingBackend::new();
        let devices = DeviceRegistry::new(backend.clone());
        let out = devices.open("synth").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        // A one-minute note returns at once.
        let long = Note::pitched(1, "C4", 6000.0).unwrap();
        let start = Instant::now();
        long.play(&out, 0, &cancel).unwrap();

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(backend.log("synth").bytes().len(), 2);
    }

    #[test]
    fn test_play_on_closed_device_fails() {
        let devices = DeviceRegistry::new(RecordingBackend::new());
        let out = devices.open("synth").unwrap();
        out.close();

        let err = Note::pitched(4, "C4", 1.0)
            .unwrap()
            .play(&out, 0, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Midi(mass_midi_io::Error::DeviceClosed(_))));
    }
}
