//! Centralized error type for the mass umbrella crate.
//!
//! Wraps the pitch and device errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pitch(#[from] mass_midi::PitchError),

    #[error("MIDI: {0}")]
    Midi(#[from] mass_midi_io::Error),

    #[error("Invalid note: {0}")]
    InvalidNote(String),

    #[error("Playback of '{0}' panicked")]
    Panicked(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The device error behind this error, if any.
    pub fn as_device_error(&self) -> Option<&mass_midi_io::Error> {
        match self {
            Error::Midi(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
