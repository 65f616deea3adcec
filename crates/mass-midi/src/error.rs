//! Error types for note resolution.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PitchError {
    #[error("Invalid pitch '{0}'")]
    NotFound(String),

    #[error("Pitch '{pitch}' resolves to MIDI {midi}, above 127")]
    OutOfRange { pitch: String, midi: u32 },
}

/// A string that is neither a dynamics tag nor a velocity byte.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown expression '{0}'")]
pub struct ExpressionError(pub String);

pub type Result<T> = std::result::Result<T, PitchError>;
