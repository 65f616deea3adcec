//! Pitch-name resolution.
//!
//! A pitch is written as a pitch-class spelling followed by an octave number,
//! e.g. `C4`, `F#2`, `Bb3`. The pitch class selects a base value in the lowest
//! supported octave (36-47) and each octave adds 12 semitones:
//!
//! ```
//! use mass_midi::Pitch;
//!
//! assert_eq!(Pitch::resolve("C1").unwrap().midi(), 48);
//! assert_eq!(Pitch::resolve("C4").unwrap().midi(), 84);
//! assert_eq!(Pitch::resolve("Db3").unwrap(), Pitch::resolve("Db3").unwrap());
//! ```
//!
//! An octave of `0` is treated the same as a missing octave and rejected.

use crate::error::{PitchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base MIDI value of `C` in the lowest supported octave.
const BASE_C: u8 = 36;

/// One of the 12 pitch classes. Sharps are named with an `s` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PitchClass {
    C = 0,
    Cs = 1,
    D = 2,
    Ds = 3,
    E = 4,
    F = 5,
    Fs = 6,
    G = 7,
    Gs = 8,
    A = 9,
    As = 10,
    B = 11,
}

impl PitchClass {
    /// Every accepted spelling, sharps and flats alike.
    pub const SPELLINGS: [(&'static str, PitchClass); 17] = [
        ("C", PitchClass::C),
        ("C#", PitchClass::Cs),
        ("Db", PitchClass::Cs),
        ("D", PitchClass::D),
        ("D#", PitchClass::Ds),
        ("Eb", PitchClass::Ds),
        ("E", PitchClass::E),
        ("F", PitchClass::F),
        ("F#", PitchClass::Fs),
        ("Gb", PitchClass::Fs),
        ("G", PitchClass::G),
        ("G#", PitchClass::Gs),
        ("Ab", PitchClass::Gs),
        ("A", PitchClass::A),
        ("A#", PitchClass::As),
        ("Bb", PitchClass::As),
        ("B", PitchClass::B),
    ];

    /// Look up a spelling such as `"F#"` or `"Gb"`. Case-sensitive.
    pub fn from_name(name: &str) -> Option<PitchClass> {
        Self::SPELLINGS
            .iter()
            .find(|(spelling, _)| *spelling == name)
            .map(|(_, class)| *class)
    }

    /// 36 (C) to 47 (B).
    pub const fn base(self) -> u8 {
        BASE_C + self as u8
    }
}

/// A resolved, validated pitch.
///
/// Two pitches are equal when they were resolved from the same identifier,
/// so `C#4` and `Db4` share a MIDI value but are different pitches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    id: String,
    name_len: usize,
    class: PitchClass,
    octave: u8,
}

impl Pitch {
    /// Resolve a pitch identifier like `"C4"` into a MIDI pitch.
    ///
    /// Fails with [`PitchError::NotFound`] when the pitch class is not one of
    /// the recognized spellings or the octave is missing (an octave of `0`
    /// counts as missing), and with [`PitchError::OutOfRange`] when the result
    /// does not fit a MIDI data byte.
    pub fn resolve(raw: &str) -> Result<Pitch> {
        let not_found = || PitchError::NotFound(raw.to_string());

        let name_len = raw
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(raw.len());
        let (name, digits) = raw.split_at(name_len);

        let class = PitchClass::from_name(name).ok_or_else(not_found)?;

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_found());
        }
        let octave: u32 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| not_found())?
        };
        if octave == 0 {
            return Err(not_found());
        }

        // An octave too large for the arithmetic is no octave at all.
        let midi = octave
            .checked_mul(12)
            .and_then(|semitones| semitones.checked_add(class.base() as u32))
            .ok_or_else(not_found)?;
        if midi > 127 {
            return Err(PitchError::OutOfRange {
                pitch: raw.to_string(),
                midi,
            });
        }

        Ok(Pitch {
            id: raw.to_string(),
            name_len,
            class,
            octave: octave as u8,
        })
    }

    /// The identifier this pitch was resolved from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The pitch-class spelling, e.g. `"Gb"`.
    pub fn name(&self) -> &str {
        &self.id[..self.name_len]
    }

    pub fn class(&self) -> PitchClass {
        self.class
    }

    /// Always at least 1.
    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// Base value of the pitch class (36-47).
    pub fn base(&self) -> u8 {
        self.class.base()
    }

    /// `base + 12 * octave`.
    pub fn midi(&self) -> u8 {
        self.base() + 12 * self.octave
    }
}

impl FromStr for Pitch {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self> {
        Pitch::resolve(s)
    }
}

impl TryFrom<String> for Pitch {
    type Error = PitchError;

    fn try_from(id: String) -> Result<Self> {
        Pitch::resolve(&id)
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> String {
        pitch.id
    }
}

impl From<&Pitch> for u8 {
    fn from(pitch: &Pitch) -> u8 {
        pitch.midi()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
