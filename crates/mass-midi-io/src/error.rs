//! Error types for the MIDI output subsystem.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("No MIDI output device found matching '{0}'")]
    DeviceNotFound(String),

    #[error("MIDI write to '{device}' failed: {message}")]
    DeviceWrite { device: String, message: String },

    #[error("MIDI output '{0}' is closed")]
    DeviceClosed(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
