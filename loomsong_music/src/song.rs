// The song timeline: the generator's output and the encoder's input.
//
// A `Song` holds tempo, time signature and an ordered list of `Track`s. Each
// track is an append-only list of `NoteEvent`s positioned on an exact tick
// grid (4 ticks per beat). Rests are ordinary events with velocity 0, so the
// start of every event equals the end of the one before it.
//
// Tracks are filled by track.rs and frozen once compose.rs hands the song
// out; nothing outside this crate can append to them. MIDI is derived from
// the song in midi.rs, never the other way around.

use crate::duration::{Duration, TICKS_PER_BEAT};
use crate::error::{ComposeError, Result};
use crate::scale::PITCH_CLASS_NAMES;
use crate::velocity::REST;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Largest accepted numerator; the MIDI time-signature event holds one byte.
pub const MAX_NUMERATOR: u32 = 255;

/// Time signature. `numerator` beats per measure, each beat one
/// `1/denominator` note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if !(1..=MAX_NUMERATOR).contains(&numerator) {
            return Err(ComposeError::config(
                "time_sig_numerator",
                format!("{numerator} is outside 1..={MAX_NUMERATOR}"),
            ));
        }
        if !matches!(denominator, 1 | 2 | 4 | 8 | 16) {
            return Err(ComposeError::config(
                "time_sig_denominator",
                format!("{denominator} is not one of 1, 2, 4, 8, 16"),
            ));
        }
        Ok(TimeSignature {
            numerator,
            denominator,
        })
    }

    pub fn measure_ticks(&self) -> u32 {
        self.numerator * TICKS_PER_BEAT
    }

    /// Wall-clock length of `ticks` at `tempo_bpm` quarter notes per minute.
    pub fn ticks_to_seconds(&self, ticks: u64, tempo_bpm: f64) -> f64 {
        ticks as f64 * 60.0 / (tempo_bpm * self.denominator as f64)
    }
}

/// One generated note or rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch. Still meaningful on rests (the pitch that would have sounded).
    pub pitch: u8,
    /// 1-127 for a sounding note, 0 for a rest.
    pub velocity: u8,
    pub duration: Duration,
    /// Onset in ticks from the start of the track.
    pub start_tick: u64,
}

impl NoteEvent {
    pub fn is_rest(&self) -> bool {
        self.velocity == REST
    }

    pub fn start_beats(&self) -> f64 {
        self.start_tick as f64 / TICKS_PER_BEAT as f64
    }

    pub fn end_tick(&self) -> u64 {
        self.start_tick + self.duration.ticks() as u64
    }
}

/// One instrument's event stream plus the metadata the encoder needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// General MIDI program number.
    pub instrument: u8,
    pub channel: u8,
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    events: Vec<NoteEvent>,
}

impl Track {
    pub fn new(
        name: impl Into<String>,
        instrument: u8,
        channel: u8,
        tempo_bpm: f64,
        time_signature: TimeSignature,
    ) -> Self {
        Track {
            name: name.into(),
            instrument,
            channel,
            tempo_bpm,
            time_signature,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub(crate) fn push(&mut self, event: NoteEvent) {
        self.events.push(event);
    }

    /// Tick where the last event ends (0 for an empty track).
    pub fn end_tick(&self) -> u64 {
        self.events.last().map_or(0, NoteEvent::end_tick)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.time_signature
            .ticks_to_seconds(self.end_tick(), self.tempo_bpm)
    }
}

/// A finished composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    pub tracks: Vec<Track>,
}

impl Song {
    /// Length of the longest track in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.tracks
            .iter()
            .map(Track::elapsed_seconds)
            .fold(0.0, f64::max)
    }

    /// Compact text rendering: one line per track, `|` at bar lines, rests
    /// as `.`, notes as name plus a duration letter (s/e/q/h/w).
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let measure = self.time_signature.measure_ticks() as u64;
        for track in &self.tracks {
            let _ = write!(out, "{:>8}:", track.name);
            for event in track.events() {
                if event.start_tick > 0 && event.start_tick % measure == 0 {
                    out.push_str(" |");
                }
                out.push(' ');
                if event.is_rest() {
                    out.push('.');
                } else {
                    out.push_str(&pitch_name(event.pitch));
                }
                out.push(event.duration.symbol());
            }
            out.push('\n');
        }
        out
    }

    pub fn stats(&self) -> SongStats {
        let mut stats = SongStats::default();
        for track in &self.tracks {
            for event in track.events() {
                stats.total_events += 1;
                if event.is_rest() {
                    stats.rests += 1;
                } else {
                    stats.sounding += 1;
                }
            }
        }
        stats.measures = self
            .tracks
            .iter()
            .map(|t| t.end_tick().div_ceil(self.time_signature.measure_ticks() as u64))
            .max()
            .unwrap_or(0);
        stats
    }
}

/// Event counts across a song.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SongStats {
    pub total_events: usize,
    pub sounding: usize,
    pub rests: usize,
    pub measures: u64,
}

/// Note name with octave, MIDI 60 = "C4".
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", PITCH_CLASS_NAMES[(pitch % 12) as usize], octave)
}
