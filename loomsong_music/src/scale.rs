// Scales and key signatures.
//
// A `Scale` is an ordered set of pitches that all sit in one reference
// octave (usually 0..12, but `[60, 62, 65, 67, 69]` is equally valid). It
// defines which pitch classes the quantizer may produce. The `KeySignature`
// is a plain semitone transposition applied after quantization.
//
// Named scales and key names exist for the CLI and JSON configs; the
// generator itself only ever sees the tone list and the offset.

use crate::error::{ComposeError, Result};

/// Pitch class names, sharps only (indexed by pitch class 0-11).
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// An ordered set of allowed tones within one reference octave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    tones: Vec<i32>,
}

impl Scale {
    /// Build a scale, rejecting empty, duplicated, or multi-octave tone lists.
    pub fn new(tones: Vec<i32>) -> Result<Self> {
        let Some(&first) = tones.first() else {
            return Err(ComposeError::config("scale", "scale must not be empty"));
        };
        let octave = first.div_euclid(12);
        for (i, &tone) in tones.iter().enumerate() {
            if tone.div_euclid(12) != octave {
                return Err(ComposeError::config(
                    "scale",
                    format!("tone {tone} is outside the reference octave of {first}"),
                ));
            }
            if tones[..i].contains(&tone) {
                return Err(ComposeError::config(
                    "scale",
                    format!("tone {tone} appears more than once"),
                ));
            }
        }
        Ok(Scale { tones })
    }

    /// Look up a scale by name. Tones are given from C (pitch class 0);
    /// transpose with a `KeySignature`.
    pub fn named(name: &str) -> Option<Self> {
        let tones: &[i32] = match name.to_lowercase().as_str() {
            // The five-tone set used by the reference scenario.
            "pentatonic" => &[0, 2, 5, 7, 9],
            "major-pentatonic" => &[0, 2, 4, 7, 9],
            "minor-pentatonic" => &[0, 3, 5, 7, 10],
            "major" | "ionian" => &[0, 2, 4, 5, 7, 9, 11],
            "minor" | "aeolian" => &[0, 2, 3, 5, 7, 8, 10],
            "dorian" => &[0, 2, 3, 5, 7, 9, 10],
            "phrygian" => &[0, 1, 3, 5, 7, 8, 10],
            "lydian" => &[0, 2, 4, 6, 7, 9, 11],
            "mixolydian" => &[0, 2, 4, 5, 7, 9, 10],
            "blues" => &[0, 3, 5, 6, 7, 10],
            "whole-tone" => &[0, 2, 4, 6, 8, 10],
            "chromatic" => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            _ => return None,
        };
        Some(Scale {
            tones: tones.to_vec(),
        })
    }

    pub fn tones(&self) -> &[i32] {
        &self.tones
    }

    /// The octave (as `div_euclid(12)`) that all tones share.
    pub fn reference_octave(&self) -> i32 {
        self.tones[0].div_euclid(12)
    }

    /// Whether a pitch class (any integer, folded mod 12) is in the scale.
    pub fn contains_pitch_class(&self, pitch_class: i32) -> bool {
        let pc = pitch_class.rem_euclid(12);
        self.tones.iter().any(|&t| t.rem_euclid(12) == pc)
    }
}

/// Semitone transposition in [0, 11], applied after quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeySignature(u8);

impl KeySignature {
    pub fn new(offset: u8) -> Result<Self> {
        if offset > 11 {
            return Err(ComposeError::config(
                "key_signature",
                format!("{offset} is outside 0..=11"),
            ));
        }
        Ok(KeySignature(offset))
    }

    /// Parse a key name such as `"F#"`, `"Bb"` or `"c"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let natural: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let accidental: i32 = match chars.as_str() {
            "" => 0,
            "#" | "sharp" => 1,
            "b" | "flat" => -1,
            _ => return None,
        };
        Some(KeySignature((natural + accidental).rem_euclid(12) as u8))
    }

    pub fn offset(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.0 as usize]
    }
}
