//! "Your Love": an arpeggio and a bass line on two synths.
//!
//! Plays until the timeout (seconds, default 30) and then stops both loops.
//!
//! ```bash
//! cargo run --example your_love --features midi-io -- 60
//! ```

use mass::prelude::*;
use std::time::Duration;

fn main() -> mass::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let seconds: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(30);

    let engine = MassEngine::builder().midi_hardware().build()?;
    println!("MIDI outputs: {:?}", engine.list_devices());

    let song = SequenceBuilder::new("Your Love")
        .tempo(125.0)
        .pattern(
            PatternBuilder::new("Arpeggio", "KORG INC. MS-20M Kit")
                .bars(32)
                .repeat(true)
                .note(8, "G4")
                .note(8, "E4")
                .note(8, "C4"),
        )
        .pattern(
            PatternBuilder::new("Bass Line", "Dave Smith Instruments Tempest")
                .bars(32)
                .repeat(true)
                .note(8, "G4")
                .note(4, "E4")
                .note(8, "C4")
                .note(4, "C4")
                .note(4, "C4"),
        )
        .build()?;

    let playback = engine.spawn(song)?;
    std::thread::sleep(Duration::from_secs(seconds));
    playback.stop_and_wait()
}
