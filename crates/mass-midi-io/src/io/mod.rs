//! Hardware MIDI output.
//!
//! Device enumeration and connection via midir.
//! Requires the `midi-io` feature.

mod output;

pub use output::{MidiOutputDevice, MidirBackend};
