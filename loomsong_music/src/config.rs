// Composition parameters.
//
// `CompositionParams` is the single immutable input to `compose`. It is a
// serde struct so it can be loaded from JSON; every field has a default, so a
// config file only needs the fields it changes. Per-part settings
// (instrument, pitch register, duration candidates) are grouped into
// `PartParams`, one for the melody and one for the rhythm/bass line.
//
// `validate` checks everything up front and converts the raw numbers into the
// typed scale, key and time signature the generator works with. Nothing is
// generated from parameters that fail validation.
//
// See also: compose.rs (the only consumer), duration.rs for the candidate-set
// rule that keeps the measure budget from starving.

use crate::duration::{Duration, check_candidates};
use crate::error::{ComposeError, Result};
use crate::scale::{KeySignature, Scale};
use crate::song::TimeSignature;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one generated part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartParams {
    /// General MIDI program number (0-127).
    pub instrument: u8,
    /// Raw pitch at noise value 0, before quantization.
    pub center_pitch: i32,
    /// Raw pitch swing at noise value ±1.
    pub pitch_span: i32,
    /// Candidate durations; selection indexes them in this order.
    pub durations: Vec<Duration>,
}

impl PartParams {
    /// Marimba in the middle register, every duration allowed.
    pub fn melody() -> Self {
        PartParams {
            instrument: 12,
            center_pitch: 60,
            pitch_span: 12,
            durations: Duration::ALL.to_vec(),
        }
    }

    /// Fingered bass, low register, eighths to halves.
    pub fn rhythm() -> Self {
        PartParams {
            instrument: 33,
            center_pitch: 40,
            pitch_span: 7,
            durations: vec![Duration::Eighth, Duration::Quarter, Duration::Half],
        }
    }

    fn validate(&self, part: &'static str, measure_ticks: u32) -> Result<()> {
        if self.instrument > 127 {
            return Err(ComposeError::config(
                part,
                format!("instrument {} is outside 0..=127", self.instrument),
            ));
        }
        if !(0..=127).contains(&self.center_pitch) {
            return Err(ComposeError::config(
                part,
                format!("center_pitch {} is outside 0..=127", self.center_pitch),
            ));
        }
        if !(0..=63).contains(&self.pitch_span) {
            return Err(ComposeError::config(
                part,
                format!("pitch_span {} is outside 0..=63", self.pitch_span),
            ));
        }
        check_candidates(part, &self.durations, measure_ticks)
    }
}

/// Everything `compose` needs to produce a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionParams {
    /// Quarter notes per minute.
    pub tempo_bpm: f64,
    /// Allowed tones, all within one reference octave.
    pub scale: Vec<i32>,
    /// Transposition after quantization, 0-11.
    pub key_signature: u8,
    pub time_sig_numerator: u32,
    pub time_sig_denominator: u32,
    /// Target length; both tracks run until they reach it.
    pub melody_length_seconds: f64,
    /// Number of one-measure motifs cycled by the rhythm track.
    pub rhythm_motif_count: usize,
    pub seed: u64,
    pub melody: PartParams,
    pub rhythm: PartParams,
    /// Hard cap on events per track; reaching it is an invariant violation.
    pub max_events: usize,
}

impl Default for CompositionParams {
    fn default() -> Self {
        CompositionParams {
            tempo_bpm: 120.0,
            scale: vec![0, 2, 5, 7, 9],
            key_signature: 0,
            time_sig_numerator: 4,
            time_sig_denominator: 4,
            melody_length_seconds: 30.0,
            rhythm_motif_count: 2,
            seed: 0,
            melody: PartParams::melody(),
            rhythm: PartParams::rhythm(),
            max_events: 100_000,
        }
    }
}

/// The typed musical frame produced by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicalFrame {
    pub scale: Scale,
    pub key: KeySignature,
    pub time_signature: TimeSignature,
}

impl CompositionParams {
    /// The reference scenario: F# pentatonic, 4/4 at 120 bpm, 20 seconds,
    /// seed 62.
    pub fn f_sharp_pentatonic() -> Self {
        CompositionParams {
            key_signature: 6,
            melody_length_seconds: 20.0,
            seed: 62,
            ..Default::default()
        }
    }

    /// Load parameters from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let params: CompositionParams = serde_json::from_str(&data)?;
        Ok(params)
    }

    /// Check every parameter and build the typed frame.
    pub fn validate(&self) -> Result<MusicalFrame> {
        if !self.tempo_bpm.is_finite() || self.tempo_bpm <= 0.0 {
            return Err(ComposeError::config(
                "tempo_bpm",
                format!("{} must be a positive number", self.tempo_bpm),
            ));
        }
        if !self.melody_length_seconds.is_finite() || self.melody_length_seconds <= 0.0 {
            return Err(ComposeError::config(
                "melody_length_seconds",
                format!("{} must be a positive number", self.melody_length_seconds),
            ));
        }
        if self.rhythm_motif_count < 1 {
            return Err(ComposeError::config(
                "rhythm_motif_count",
                "at least one motif is required",
            ));
        }
        if self.max_events == 0 {
            return Err(ComposeError::config(
                "max_events",
                "the event bound must be positive",
            ));
        }
        let scale = Scale::new(self.scale.clone())?;
        let key = KeySignature::new(self.key_signature)?;
        let time_signature =
            TimeSignature::new(self.time_sig_numerator, self.time_sig_denominator)?;

        let measure_ticks = time_signature.measure_ticks();
        self.melody.validate("melody", measure_ticks)?;
        self.rhythm.validate("rhythm", measure_ticks)?;

        Ok(MusicalFrame {
            scale,
            key,
            time_signature,
        })
    }
}
