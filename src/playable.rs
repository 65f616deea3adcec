//! Anything that can be played: a lone note, a pattern or a sequence.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::note::Note;
use crate::pattern::Pattern;
use crate::sequence::Sequence;
use mass_midi_io::DeviceRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum Playable {
    /// A single note sent straight to a device.
    Note {
        note: Note,
        device: String,
        channel: u8,
    },
    Pattern(Pattern),
    Sequence(Sequence),
}

impl Playable {
    pub fn note(note: Note, device: impl Into<String>) -> Self {
        Playable::Note {
            note,
            device: device.into(),
            channel: 0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Playable::Note { device, .. } => device,
            Playable::Pattern(p) => p.name(),
            Playable::Sequence(s) => s.name(),
        }
    }

    /// Play to completion (or cancellation), blocking the caller.
    pub fn play(&self, devices: &DeviceRegistry, cancel: &CancellationToken) -> Result<()> {
        match self {
            Playable::Note {
                note,
                device,
                channel,
            } => {
                let out = devices.open(device)?;
                let result = note.play(&out, *channel, cancel);
                out.close();
                result
            }
            Playable::Pattern(pattern) => pattern.play(devices, cancel),
            Playable::Sequence(sequence) => sequence.play(devices, cancel),
        }
    }
}

impl From<Pattern> for Playable {
    fn from(pattern: Pattern) -> Self {
        Playable::Pattern(pattern)
    }
}

impl From<Sequence> for Playable {
    fn from(sequence: Sequence) -> Self {
        Playable::Sequence(sequence)
    }
}
