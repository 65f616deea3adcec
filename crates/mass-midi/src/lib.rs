//! MIDI note types for mass.
//!
//! Pure value types with no I/O: pitch-name resolution and dynamics-to-velocity
//! mapping. Playback lives in the `mass` crate, device output in `mass-midi-io`.
//!
//! # Example
//!
//! ```
//! use mass_midi::{Dynamic, Expression, Pitch};
//!
//! let pitch = Pitch::resolve("C#4").unwrap();
//! assert_eq!(pitch.midi(), 85);
//!
//! assert_eq!(Expression::from(Dynamic::Ff).velocity(), 127);
//! assert_eq!(Expression::default().velocity(), 97);
//! ```

pub mod error;
pub use error::{ExpressionError, PitchError, Result};

pub mod dynamics;
pub use dynamics::{Dynamic, Expression};

pub mod pitch;
pub use pitch::{Pitch, PitchClass};
