//! Test helpers and fixtures for mass integration tests
//!
//! Everything runs against in-memory backends, so no MIDI hardware is needed.
//! Tempos are tiny so note durations stay in the millisecond range:
//! at `FAST_TEMPO` a quarter note lasts 2.5 ms.

#![allow(dead_code)]

use mass::midi_io::{self, MidiOutputMessage, OutputBackend, OutputConnection};
use mass::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

pub const FAST_TEMPO: f64 = 1.0;

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Engine over a fresh recording backend.
pub fn test_engine() -> (MassEngine, RecordingBackend) {
    let backend = RecordingBackend::new();
    let engine = MassEngine::builder()
        .backend(backend.clone())
        .build()
        .expect("Failed to create test engine");
    (engine, backend)
}

/// A pattern of quarter notes at `FAST_TEMPO`.
pub fn quarters(name: &str, device: &str, pitches: &[&str]) -> Pattern {
    let mut pattern = Pattern::new(name, device, FAST_TEMPO);
    for pitch in pitches {
        pattern.note(4, pitch).expect("valid pitch");
    }
    pattern
}

/// Check that `bytes` is a run of note-on/note-off pairs, each pair for the
/// same pitch and velocity, and return the pitches in order.
pub fn paired_pitches(bytes: &[[u8; 3]]) -> Vec<u8> {
    assert_eq!(bytes.len() % 2, 0, "unpaired message in {:02X?}", bytes);
    bytes
        .chunks(2)
        .map(|pair| {
            assert_eq!(pair[0][0] & 0xF0, 0x90, "expected note-on, got {:02X?}", pair[0]);
            assert_eq!(pair[1][0] & 0xF0, 0x80, "expected note-off, got {:02X?}", pair[1]);
            assert_eq!(pair[0][1..], pair[1][1..], "note-off does not match note-on");
            pair[0][1]
        })
        .collect()
}

/// A device that writes one byte at a time, like a serial line.
///
/// All connections append to the same stream, so any interleaving inside a
/// message would be visible.
#[derive(Clone, Default)]
pub struct ByteStreamBackend {
    pub stream: Arc<Mutex<Vec<u8>>>,
}

struct ByteStreamConnection {
    stream: Arc<Mutex<Vec<u8>>>,
}

impl OutputBackend for ByteStreamBackend {
    fn open(&self, _name: &str) -> midi_io::Result<Box<dyn OutputConnection>> {
        Ok(Box::new(ByteStreamConnection {
            stream: Arc::clone(&self.stream),
        }))
    }

    fn list_devices(&self) -> Vec<String> {
        Vec::new()
    }
}

impl OutputConnection for ByteStreamConnection {
    fn send(&mut self, message: &MidiOutputMessage) -> midi_io::Result<()> {
        for byte in message.bytes {
            self.stream.lock().push(byte);
            thread::yield_now();
        }
        Ok(())
    }

    fn close(&mut self) {}
}
