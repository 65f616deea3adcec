//! # Mass - symbolic music to MIDI
//!
//! Notes are written as a rhythmic value plus a pitch id such as `"C#4"`,
//! grouped into patterns bound to an output device, and patterns are grouped
//! into sequences that play concurrently.
//!
//! ## Architecture
//!
//! Mass is an umbrella crate over two subsystems:
//! - **mass-midi** - pitch resolution and the dynamics velocity table
//! - **mass-midi-io** - output devices: a shared registry, midir and recording backends
//!
//! ## Quick Start
//!
//! ```
//! use mass::prelude::*;
//!
//! let backend = RecordingBackend::new();
//! let engine = MassEngine::builder().backend(backend.clone()).build()?;
//!
//! let song = SequenceBuilder::new("sketch")
//!     .tempo(2.0)
//!     .pattern(PatternBuilder::new("lead", "synth").note(8, "G4").note(8, "E4"))
//!     .pattern(PatternBuilder::new("bass", "bass").note(4, "C4"))
//!     .build()?;
//!
//! engine.play(&song.into())?;
//! assert_eq!(backend.log("synth").messages().len(), 4);
//! assert_eq!(backend.log("bass").messages().len(), 2);
//! # Ok::<(), mass::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` - hardware output through midir

/// Re-export of mass-midi for direct access
pub use mass_midi as midi;

/// Re-export of mass-midi-io for direct access
pub use mass_midi_io as midi_io;

pub use mass_midi::{Dynamic, Expression, Pitch, PitchClass, PitchError};
pub use mass_midi_io::{
    DeviceHandle, DeviceRegistry, MidiOutputMessage, OutputBackend, OutputConnection,
    RecordingBackend,
};

#[cfg(feature = "midi-io")]
pub use mass_midi_io::{MidiOutputDevice, MidirBackend};

mod error;
pub use error::{Error, Result};

mod cancel;
pub use cancel::CancellationToken;

mod note;
pub use note::Note;

mod pattern;
pub use pattern::Pattern;

mod sequence;
pub use sequence::{PatternOutcome, Sequence, SequenceOptions, SequenceReport};

mod playable;
pub use playable::Playable;

mod engine;
pub use engine::{MassEngine, PlaybackHandle};

mod builder;
pub use builder::MassEngineBuilder;

pub mod builders;
pub use builders::{
    NoteDefinition, PatternBuilder, PatternDefinition, SequenceBuilder, SequenceDefinition,
};

/// Everything needed to define and play music.
pub mod prelude {
    pub use crate::{
        CancellationToken, Dynamic, Error, Expression, MassEngine, Note, Pattern, PatternBuilder,
        Playable, RecordingBackend, Result, Sequence, SequenceBuilder,
    };

    #[cfg(feature = "midi-io")]
    pub use crate::MidirBackend;
}
