//! Fluent builders and serializable definitions for sequences and patterns.
//!
//! A definition is plain data (serde), a builder fills one in fluently, and
//! `build()` resolves every pitch and timing into playable values. Errors in
//! any note surface from `build()` before anything is played.
//!
//! # Example
//!
//! ```
//! use mass::prelude::*;
//!
//! let song = SequenceBuilder::new("Your Love")
//!     .tempo(125.0)
//!     .pattern(
//!         PatternBuilder::new("Arpeggio", "MS-20")
//!             .repeat(true)
//!             .note(8, "G4")
//!             .note(8, "E4")
//!             .note(8, "C4"),
//!     )
//!     .build()?;
//!
//! assert_eq!(song.patterns()[0].notes().len(), 3);
//! # Ok::<(), mass::Error>(())
//! ```

use crate::pattern::Pattern;
use crate::sequence::Sequence;
use crate::Result;
use mass_midi::Expression;
use serde::{Deserialize, Serialize};

fn default_bars() -> u32 {
    Pattern::DEFAULT_BARS
}

fn default_tempo() -> f64 {
    Sequence::DEFAULT_TEMPO
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

// ============================================================================
// Definitions
// ============================================================================

/// A note as written: rhythmic value, pitch id (none for a rest), expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDefinition {
    pub value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub name: String,
    pub device: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub channel: u8,
    #[serde(default = "default_bars")]
    pub bars: u32,
    /// Falls back to the enclosing sequence's tempo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub notes: Vec<NoteDefinition>,
}

impl PatternDefinition {
    pub fn build(&self, default_tempo: f64) -> Result<Pattern> {
        let tempo = self.tempo.unwrap_or(default_tempo);
        let mut pattern = Pattern::new(&self.name, &self.device, tempo)
            .with_channel(self.channel)
            .with_bars(self.bars)
            .with_repeat(self.repeat);

        for note in &self.notes {
            match &note.pitch {
                Some(pitch) => pattern.note_with(note.value, pitch, note.expression)?,
                None => pattern.rest(note.value)?,
            };
        }
        Ok(pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub name: String,
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    #[serde(default)]
    pub patterns: Vec<PatternDefinition>,
}

impl SequenceDefinition {
    pub fn build(&self) -> Result<Sequence> {
        let mut sequence = Sequence::new(&self.name).with_tempo(self.tempo);
        for pattern in &self.patterns {
            sequence.push(pattern.build(self.tempo)?);
        }
        Ok(sequence)
    }
}

// ============================================================================
// Pattern Builder
// ============================================================================

/// Fluent builder for a [`Pattern`].
///
/// Notes are validated by `build()`, so a chain never has to stop for `?`.
#[derive(Debug, Clone)]
pub struct PatternBuilder {
    definition: PatternDefinition,
}

impl PatternBuilder {
    pub fn new(name: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            definition: PatternDefinition {
                name: name.into(),
                device: device.into(),
                channel: 0,
                bars: Pattern::DEFAULT_BARS,
                tempo: None,
                repeat: false,
                notes: Vec::new(),
            },
        }
    }

    /// Default: 0
    pub fn channel(mut self, channel: u8) -> Self {
        self.definition.channel = channel;
        self
    }

    /// Default: 4
    pub fn bars(mut self, bars: u32) -> Self {
        self.definition.bars = bars;
        self
    }

    /// Default: the sequence tempo, or 100 BPM outside a sequence.
    pub fn tempo(mut self, tempo: f64) -> Self {
        self.definition.tempo = Some(tempo);
        self
    }

    /// Default: false
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.definition.repeat = repeat;
        self
    }

    pub fn note(self, value: u32, pitch: &str) -> Self {
        self.note_with(value, pitch, Expression::default())
    }

    pub fn note_with(mut self, value: u32, pitch: &str, expression: impl Into<Expression>) -> Self {
        self.definition.notes.push(NoteDefinition {
            value,
            pitch: Some(pitch.to_string()),
            expression: expression.into(),
        });
        self
    }

    pub fn rest(mut self, value: u32) -> Self {
        self.definition.notes.push(NoteDefinition {
            value,
            pitch: None,
            expression: Expression::default(),
        });
        self
    }

    pub fn definition(&self) -> &PatternDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> PatternDefinition {
        self.definition
    }

    pub fn build(self) -> Result<Pattern> {
        self.definition.build(Sequence::DEFAULT_TEMPO)
    }
}

// ============================================================================
// Sequence Builder
// ============================================================================

/// Fluent builder for a [`Sequence`].
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    definition: SequenceDefinition,
}

impl SequenceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: SequenceDefinition {
                name: name.into(),
                tempo: Sequence::DEFAULT_TEMPO,
                patterns: Vec::new(),
            },
        }
    }

    /// Default: 100 BPM
    pub fn tempo(mut self, tempo: f64) -> Self {
        self.definition.tempo = tempo;
        self
    }

    pub fn pattern(mut self, pattern: PatternBuilder) -> Self {
        self.definition.patterns.push(pattern.into_definition());
        self
    }

    pub fn definition(&self) -> &SequenceDefinition {
        &self.definition
    }

    pub fn build(self) -> Result<Sequence> {
        self.definition.build()
    }
}

impl From<SequenceDefinition> for SequenceBuilder {
    fn from(definition: SequenceDefinition) -> Self {
        Self { definition }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use mass_midi::{Dynamic, PitchError};

    #[test]
    fn test_pattern_builder_defaults() {
        let pattern = PatternBuilder::new("p", "synth").note(4, "C4").build().unwrap();
        assert_eq!(pattern.tempo(), 100.0);
        assert_eq!(pattern.bars(), 4);
        assert_eq!(pattern.channel(), 0);
        assert!(!pattern.repeats());
    }

    #[test]
    fn test_patterns_take_sequence_tempo_unless_set() {
        let sequence = SequenceBuilder::new("song")
            .tempo(125.0)
            .pattern(PatternBuilder::new("a", "one").note(8, "G4"))
            .pattern(PatternBuilder::new("b", "two").tempo(90.0).note(8, "G4"))
            .build()
            .unwrap();

        assert_eq!(sequence.patterns()[0].notes()[0].tempo(), 125.0);
        assert_eq!(sequence.patterns()[1].notes()[0].tempo(), 90.0);
    }

    #[test]
    fn test_build_resolves_notes_and_rests() {
        let pattern = PatternBuilder::new("p", "synth")
            .note_with(4, "C4", Dynamic::Ff)
            .rest(8)
            .note_with(2, "A4", 30u8)
            .build()
            .unwrap();

        let notes = pattern.notes();
        assert_eq!(notes[0].velocity(), 127);
        assert!(notes[1].is_rest());
        assert_eq!(notes[2].velocity(), 30);
        assert_eq!(notes[2].midi(), Some(93));
    }

    #[test]
    fn test_bad_pitch_fails_build() {
        let err = SequenceBuilder::new("song")
            .pattern(PatternBuilder::new("p", "synth").note(4, "C4").note(4, "Q4"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Pitch(PitchError::NotFound(ref p)) if p == "Q4"));
    }

    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "name": "Your Love",
            "tempo": 125,
            "patterns": [
                {
                    "name": "Bass Line",
                    "device": "Tempest",
                    "repeat": true,
                    "notes": [
                        { "value": 8, "pitch": "G4" },
                        { "value": 4, "pitch": "E4", "expression": "ff" },
                        { "value": 4 },
                        { "value": 8, "pitch": "C4", "expression": 64 }
                    ]
                }
            ]
        }"#;

        let definition: SequenceDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.patterns[0].bars, 4);
        assert_eq!(definition.patterns[0].channel, 0);

        let sequence = definition.build().unwrap();
        let bass = &sequence.patterns()[0];
        assert!(bass.repeats());
        assert_eq!(bass.tempo(), 125.0);

        let velocities: Vec<u8> = bass.notes().iter().map(|n| n.velocity()).collect();
        assert_eq!(velocities, vec![97, 127, 97, 64]);
        assert!(bass.notes()[2].is_rest());
    }

    #[test]
    fn test_definition_defaults() {
        let definition: SequenceDefinition = serde_json::from_str(r#"{ "name": "empty" }"#).unwrap();
        assert_eq!(definition.tempo, 100.0);
        assert!(definition.patterns.is_empty());
    }

    #[test]
    fn test_builder_definition_serializes() {
        let builder = SequenceBuilder::new("song")
            .pattern(PatternBuilder::new("p", "synth").note(4, "C4").rest(4));

        let json = serde_json::to_value(builder.definition()).unwrap();
        let notes = &json["patterns"][0]["notes"];
        assert_eq!(notes[0]["pitch"], "C4");
        assert!(notes[0].get("expression").is_none());
        assert!(notes[1].get("pitch").is_none());
    }
}
