//! MIDI output subsystem for mass.
//!
//! Provides the device side of playback: output backends, a registry that
//! keeps exactly one writer per device name, and an in-memory recording
//! backend for tests and dry runs.
//!
//! Feature gates: `midi-io` (hardware output via midir).
//!
//! # Example
//!
//! ```
//! use mass_midi_io::{DeviceRegistry, RecordingBackend};
//!
//! let backend = RecordingBackend::new();
//! let devices = DeviceRegistry::new(backend.clone());
//!
//! let out = devices.open("synth").unwrap();
//! out.note_on(0, 60, 100).unwrap();
//! out.note_off(0, 60, 100).unwrap();
//! out.close();
//!
//! assert_eq!(backend.log("synth").messages().len(), 2);
//! ```

pub mod error;
pub use error::{Error, Result};

mod backend;
pub use backend::{OutputBackend, OutputConnection};

mod message;
pub use message::MidiOutputMessage;

mod registry;
pub use registry::{DeviceHandle, DeviceRegistry};

pub mod recorder;
pub use recorder::{DeviceLog, RecordedMessage, RecordingBackend};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{MidirBackend, MidiOutputDevice};
